use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Days, Local, NaiveDate, Utc};
use diesel::{
    BoolExpressionMethods, ExpressionMethods, NullableExpressionMethods, OptionalExtension,
    PgTextExpressionMethods, QueryDsl, Queryable, Selectable, SelectableHelper, dsl,
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    auth::passwords,
    core::aliases::DbPool,
    domain::receipt::{is_valid_ruc, round_money},
    models::{
        CreateCustomerEntity, CustomerEntity, CustomerProfile, DepartmentEntity, DistrictEntity,
        DocumentTypeEntity, GenderEntity, ProvinceEntity, UpdateCustomerEntity,
    },
    schema::{cliente, departamento, distrito, genero, orden_venta, provincia, tipo_documento},
    services::ServiceError,
};

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub const MIN_SEARCH_LENGTH: usize = 2;

pub const SEARCH_LIMIT: i64 = 20;

/// Customers registered within this many days count as new.
pub const NEW_CUSTOMER_DAYS: u64 = 30;

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct Locations {
    pub departamentos: Vec<DepartmentEntity>,
    pub provincias: Vec<ProvinceEntity>,
    pub distritos: Vec<DistrictEntity>,
}

/// Choices offered by the registration form.
#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct RegistrationFormData {
    pub ubicaciones: Locations,
    pub generos: Vec<GenderEntity>,
    #[serde(rename = "tiposDocumento")]
    pub tipos_documento: Vec<DocumentTypeEntity>,
}

/// Customer with the names of their district, province and department.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CustomerListing {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub usuario: String,
    pub numero_documento: Option<String>,
    pub ruc: Option<String>,
    pub fecha_registro: DateTime<Utc>,
    pub distrito: Option<String>,
    pub provincia: Option<String>,
    pub departamento: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: CustomerListing,
    pub total_ordenes: i64,
    pub total_gastado: Decimal,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct CustomerStats {
    pub total_clientes: i64,
    pub nuevos_mes: i64,
    /// Customers with at least one order.
    pub clientes_activos: i64,
    /// Orders per active customer. `None` while nobody has ordered.
    pub promedio_ordenes: Option<Decimal>,
}

impl CustomerStats {
    pub fn from_counts(total_clientes: i64, nuevos_mes: i64, orders_per_customer: &[i64]) -> Self {
        let clientes_activos = orders_per_customer.iter().filter(|&&n| n > 0).count() as i64;
        let orders: i64 = orders_per_customer.iter().sum();

        let promedio_ordenes = Decimal::from(orders)
            .checked_div(Decimal::from(clientes_activos))
            .map(round_money);

        Self {
            total_clientes,
            nuevos_mes,
            clientes_activos,
            promedio_ordenes,
        }
    }
}

#[derive(Queryable, Selectable, Serialize, Debug, Clone, PartialEq, ToSchema)]
#[diesel(table_name = cliente)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct CustomerMatch {
    pub id: i32,
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub telefono: Option<String>,
    pub usuario: String,
}

/// `ILIKE` pattern matching `term` anywhere, with its wildcards escaped.
/// `None` when the trimmed term is too short to search for.
pub fn search_pattern(term: &str) -> Option<String> {
    let term = term.trim();
    if term.chars().count() < MIN_SEARCH_LENGTH {
        return None;
    }

    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');

    Some(pattern)
}

/// Local midnight `NEW_CUSTOMER_DAYS` days before `today`.
pub fn new_customers_since(today: NaiveDate) -> Option<DateTime<Utc>> {
    today
        .checked_sub_days(Days::new(NEW_CUSTOMER_DAYS))?
        .and_hms_opt(0, 0, 0)?
        .and_local_timezone(Local)
        .earliest()
        .map(|midnight| midnight.with_timezone(&Utc))
}

/// Order count and amount spent per customer that has ordered.
async fn order_totals(
    conn: &mut AsyncPgConnection,
) -> Result<HashMap<i32, (i64, Decimal)>, ServiceError> {
    let rows: Vec<(i32, i64, Option<Decimal>)> = orden_venta::table
        .group_by(orden_venta::cliente_id)
        .select((
            orden_venta::cliente_id,
            dsl::count_star(),
            dsl::sum(orden_venta::total),
        ))
        .load(conn)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(cliente_id, orders, spent)| (cliente_id, (orders, spent.unwrap_or_default())))
        .collect())
}

/// Registration input with the password still in plain text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewCustomer {
    pub nombre: String,
    pub apellido: String,
    pub email: String,
    pub usuario: String,
    pub contrasena: String,
    pub telefono: Option<String>,
    pub direccion: Option<String>,
    pub tipo_documento_id: Option<i32>,
    pub numero_documento: Option<String>,
    pub genero_id: Option<i32>,
    pub distrito_id: Option<i32>,
    pub ruc: Option<String>,
}

impl NewCustomer {
    /// Validates required fields and normalizes the optional RUC (blank
    /// becomes `None`).
    pub fn validate(mut self) -> Result<Self, ServiceError> {
        let required = [
            &self.nombre,
            &self.apellido,
            &self.email,
            &self.usuario,
            &self.contrasena,
        ];
        if required.iter().any(|value| value.trim().is_empty()) {
            return Err(ServiceError::Validation(
                "Todos los campos obligatorios deben estar completos".into(),
            ));
        }

        if self.contrasena.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ServiceError::Validation(format!(
                "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres"
            )));
        }

        self.ruc = self
            .ruc
            .map(|ruc| ruc.trim().to_string())
            .filter(|ruc| !ruc.is_empty());

        if let Some(ruc) = &self.ruc {
            if !is_valid_ruc(ruc) {
                return Err(ServiceError::Validation(
                    "El RUC debe tener exactamente 11 dígitos numéricos".into(),
                ));
            }
        }

        self.numero_documento = self
            .numero_documento
            .map(|doc| doc.trim().to_string())
            .filter(|doc| !doc.is_empty());

        Ok(self)
    }
}

#[derive(Debug, Clone)]
pub struct PgCustomersService {
    db_pool: DbPool,
}

impl PgCustomersService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl CustomersService for PgCustomersService {
    async fn register(&self, customer: NewCustomer) -> Result<CustomerProfile, ServiceError> {
        let customer = customer.validate()?;
        let contrasena = passwords::hash_password(customer.contrasena).await?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let profile = diesel::insert_into(cliente::table)
            .values(CreateCustomerEntity {
                nombre: customer.nombre,
                apellido: customer.apellido,
                email: customer.email,
                usuario: customer.usuario,
                contrasena,
                telefono: customer.telefono,
                direccion: customer.direccion,
                tipo_documento_id: customer.tipo_documento_id,
                numero_documento: customer.numero_documento,
                genero_id: customer.genero_id,
                distrito_id: customer.distrito_id,
                ruc: customer.ruc,
            })
            .returning(CustomerProfile::as_returning())
            .get_result(conn)
            .await?;

        tracing::info!("Registered customer #{} ({})", profile.id, profile.usuario);

        Ok(profile)
    }

    async fn find_by_login(&self, login: &str) -> Result<Option<CustomerEntity>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let customer = cliente::table
            .filter(cliente::usuario.eq(login).or(cliente::email.eq(login)))
            .select(CustomerEntity::as_select())
            .first(conn)
            .await
            .optional()?;

        Ok(customer)
    }

    async fn profile(&self, cliente_id: i32) -> Result<CustomerProfile, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        cliente::table
            .find(cliente_id)
            .select(CustomerProfile::as_select())
            .first(conn)
            .await
            .optional()?
            .ok_or(ServiceError::CustomerNotFound)
    }

    async fn update_profile(
        &self,
        cliente_id: i32,
        changes: UpdateCustomerEntity,
    ) -> Result<CustomerProfile, ServiceError> {
        if changes == UpdateCustomerEntity::default() {
            return Err(ServiceError::Validation(
                "No se enviaron campos para actualizar".into(),
            ));
        }

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::update(cliente::table.find(cliente_id))
            .set(&changes)
            .returning(CustomerProfile::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .ok_or(ServiceError::CustomerNotFound)
    }

    async fn form_data(&self) -> Result<RegistrationFormData, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let departamentos = departamento::table
            .order(departamento::nombre.asc())
            .select(DepartmentEntity::as_select())
            .load(conn)
            .await?;
        let provincias = provincia::table
            .order(provincia::nombre.asc())
            .select(ProvinceEntity::as_select())
            .load(conn)
            .await?;
        let distritos = distrito::table
            .order(distrito::nombre.asc())
            .select(DistrictEntity::as_select())
            .load(conn)
            .await?;
        let generos = genero::table
            .order(genero::id.asc())
            .select(GenderEntity::as_select())
            .load(conn)
            .await?;
        let tipos_documento = tipo_documento::table
            .order(tipo_documento::id.asc())
            .select(DocumentTypeEntity::as_select())
            .load(conn)
            .await?;

        tracing::debug!(
            "Loaded form data: {} departments, {} provinces, {} districts",
            departamentos.len(),
            provincias.len(),
            distritos.len()
        );

        Ok(RegistrationFormData {
            ubicaciones: Locations {
                departamentos,
                provincias,
                distritos,
            },
            generos,
            tipos_documento,
        })
    }

    async fn list_with_orders(&self) -> Result<Vec<CustomerSummary>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let customers: Vec<CustomerListing> = cliente::table
            .left_join(distrito::table.left_join(provincia::table.left_join(departamento::table)))
            .order((cliente::fecha_registro.desc(), cliente::id.desc()))
            .select((
                cliente::id,
                cliente::nombre,
                cliente::apellido,
                cliente::email,
                cliente::telefono,
                cliente::direccion,
                cliente::usuario,
                cliente::numero_documento,
                cliente::ruc,
                cliente::fecha_registro,
                distrito::nombre.nullable(),
                provincia::nombre.nullable(),
                departamento::nombre.nullable(),
            ))
            .load(conn)
            .await?;

        let mut totals = order_totals(conn).await?;

        tracing::info!("Listed {} customers", customers.len());

        Ok(customers
            .into_iter()
            .map(|customer| {
                let (total_ordenes, total_gastado) =
                    totals.remove(&customer.id).unwrap_or_default();
                CustomerSummary {
                    customer,
                    total_ordenes,
                    total_gastado: round_money(total_gastado),
                }
            })
            .collect())
    }

    async fn stats(&self) -> Result<CustomerStats, ServiceError> {
        let since = new_customers_since(Local::now().date_naive())
            .context("Failed to compute the new customer window")?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let total_clientes = cliente::table.count().get_result(conn).await?;
        let nuevos_mes = cliente::table
            .filter(cliente::fecha_registro.ge(since))
            .count()
            .get_result(conn)
            .await?;
        let orders: Vec<i64> = order_totals(conn)
            .await?
            .into_values()
            .map(|(orders, _)| orders)
            .collect();

        Ok(CustomerStats::from_counts(total_clientes, nuevos_mes, &orders))
    }

    async fn search(&self, term: &str) -> Result<Vec<CustomerMatch>, ServiceError> {
        let pattern = search_pattern(term).ok_or_else(|| {
            ServiceError::Validation(format!(
                "Ingresa al menos {MIN_SEARCH_LENGTH} caracteres"
            ))
        })?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let matches = cliente::table
            .filter(
                cliente::nombre
                    .ilike(&pattern)
                    .or(cliente::apellido.ilike(&pattern))
                    .or(cliente::email.ilike(&pattern))
                    .or(cliente::usuario.ilike(&pattern))
                    .or(cliente::telefono.ilike(&pattern)),
            )
            .order((cliente::nombre.asc(), cliente::id.asc()))
            .limit(SEARCH_LIMIT)
            .select(CustomerMatch::as_select())
            .load(conn)
            .await?;

        Ok(matches)
    }
}

#[automock]
#[async_trait]
pub trait CustomersService: Send + Sync {
    /// Validates, hashes the password and stores a new customer. Duplicate
    /// e-mail, username, document or RUC yields [`ServiceError::Conflict`].
    async fn register(&self, customer: NewCustomer) -> Result<CustomerProfile, ServiceError>;

    /// Looks a customer up by username or e-mail.
    async fn find_by_login(&self, login: &str) -> Result<Option<CustomerEntity>, ServiceError>;

    async fn profile(&self, cliente_id: i32) -> Result<CustomerProfile, ServiceError>;

    /// Partial update of the editable profile fields.
    async fn update_profile(
        &self,
        cliente_id: i32,
        changes: UpdateCustomerEntity,
    ) -> Result<CustomerProfile, ServiceError>;

    /// Locations, genders and document types for the registration form.
    async fn form_data(&self) -> Result<RegistrationFormData, ServiceError>;

    /// Every customer, newest first, with their order count and amount spent.
    async fn list_with_orders(&self) -> Result<Vec<CustomerSummary>, ServiceError>;

    async fn stats(&self) -> Result<CustomerStats, ServiceError>;

    /// Up to [`SEARCH_LIMIT`] customers whose name, username, e-mail or phone
    /// contains `term`.
    async fn search(&self, term: &str) -> Result<Vec<CustomerMatch>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;
    use crate::{
        domain::{ProductKind, ReceiptKind},
        services::checkout::{CheckoutItem, CheckoutRequest, CheckoutService, PgCheckoutService},
        test_db::TestDb,
        test_helpers::unreachable_pool,
    };

    fn valid() -> NewCustomer {
        NewCustomer {
            nombre: "Ana".into(),
            apellido: "Quispe".into(),
            email: "ana@raices.test".into(),
            usuario: "ana".into(),
            contrasena: "secreto".into(),
            ..Default::default()
        }
    }

    #[test]
    fn blank_ruc_becomes_none() {
        let customer = NewCustomer {
            ruc: Some("   ".into()),
            ..valid()
        };

        assert_eq!(customer.validate().unwrap().ruc, None);
    }

    #[test]
    fn short_password_is_rejected() {
        let customer = NewCustomer {
            contrasena: "12345".into(),
            ..valid()
        };

        assert!(matches!(
            customer.validate(),
            Err(ServiceError::Validation(msg)) if msg.contains("6 caracteres")
        ));
    }

    #[test]
    fn malformed_ruc_is_rejected() {
        let customer = NewCustomer {
            ruc: Some("2012345678A".into()),
            ..valid()
        };

        assert!(matches!(customer.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let customer = NewCustomer {
            apellido: String::new(),
            ..valid()
        };

        assert!(matches!(customer.validate(), Err(ServiceError::Validation(_))));
    }

    #[test]
    fn search_pattern_escapes_wildcards() {
        assert_eq!(search_pattern(" quispe ").as_deref(), Some("%quispe%"));
        assert_eq!(search_pattern("50%_off").as_deref(), Some("%50\\%\\_off%"));
    }

    #[test]
    fn short_search_terms_have_no_pattern() {
        assert_eq!(search_pattern(""), None);
        assert_eq!(search_pattern(" a "), None);
        assert!(search_pattern("ñu").is_some());
    }

    #[tokio::test]
    async fn short_search_is_rejected_before_touching_the_database() -> TestResult {
        let service = PgCustomersService::new(unreachable_pool());

        let result = service.search("a").await;

        assert!(matches!(
            result,
            Err(ServiceError::Validation(msg)) if msg == "Ingresa al menos 2 caracteres"
        ));

        Ok(())
    }

    #[test]
    fn stats_average_orders_over_active_customers() {
        let stats = CustomerStats::from_counts(10, 2, &[3, 1, 1]);

        assert_eq!(stats.clientes_activos, 3);
        assert_eq!(stats.promedio_ordenes.map(|p| p.to_string()), Some("1.67".into()));
    }

    #[test]
    fn stats_without_orders_have_no_average() {
        let stats = CustomerStats::from_counts(4, 4, &[]);

        assert_eq!(stats.clientes_activos, 0);
        assert_eq!(stats.promedio_ordenes, None);
    }

    #[test]
    fn new_customer_window_starts_thirty_days_back() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

        let since = new_customers_since(today).unwrap();

        assert_eq!(
            since.with_timezone(&Local).date_naive(),
            NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
        );
    }

    async fn order_once(db: &TestDb, cliente_id: i32, precio_unitario: Decimal) {
        let producto_id = db.beverage("Inca Kola", precio_unitario).await;

        PgCheckoutService::new(db.pool.clone())
            .checkout(CheckoutRequest {
                cliente_id,
                tipo_entrega: "recojo".into(),
                direccion_entrega: None,
                referencia: None,
                hora_entrega: None,
                metodo_pago: "yape".into(),
                tipo_comprobante: ReceiptKind::Boleta,
                ruc: None,
                items: vec![CheckoutItem {
                    producto_id,
                    producto_tipo: ProductKind::Bebida,
                    cantidad: 1,
                    precio_unitario,
                }],
            })
            .await
            .expect("Failed to place order");
    }

    #[tokio::test]
    async fn listing_counts_orders_and_spending() -> TestResult {
        let db = TestDb::new().await;
        let ana = db.customer("ana").await;
        let luis = db.customer("luis").await;
        order_once(&db, ana, Decimal::new(1000, 2)).await;
        order_once(&db, ana, Decimal::new(500, 2)).await;
        let service = PgCustomersService::new(db.pool.clone());

        let customers = service.list_with_orders().await?;

        assert_eq!(customers.len(), 2);
        let ana_row = customers.iter().find(|c| c.customer.id == ana);
        let luis_row = customers.iter().find(|c| c.customer.id == luis);
        assert_eq!(
            ana_row.map(|c| (c.total_ordenes, c.total_gastado.to_string())),
            Some((2, "17.70".into()))
        );
        assert_eq!(
            luis_row.map(|c| (c.total_ordenes, c.total_gastado.to_string())),
            Some((0, "0.00".into()))
        );
        assert_eq!(ana_row.and_then(|c| c.customer.distrito.clone()), None);

        let stats = service.stats().await?;
        assert_eq!(stats.total_clientes, 2);
        assert_eq!(stats.nuevos_mes, 2);
        assert_eq!(stats.clientes_activos, 1);
        assert_eq!(stats.promedio_ordenes, Some(Decimal::new(200, 2)));

        Ok(())
    }

    #[tokio::test]
    async fn search_matches_any_contact_field() -> TestResult {
        let db = TestDb::new().await;
        db.customer("ana").await;
        db.customer("luis").await;
        let service = PgCustomersService::new(db.pool.clone());

        let by_username = service.search("LUI").await?;
        let by_phone = service.search("654").await?;
        let literal_wildcard = service.search("%%").await?;

        assert_eq!(by_username.len(), 1);
        assert_eq!(by_username[0].usuario, "luis");
        assert_eq!(by_phone.len(), 2);
        assert!(literal_wildcard.is_empty());

        Ok(())
    }

    #[tokio::test]
    async fn form_data_lists_seeded_choices() -> TestResult {
        let db = TestDb::new().await;
        let service = PgCustomersService::new(db.pool.clone());

        let form = service.form_data().await?;

        assert_eq!(form.generos.len(), 3);
        assert_eq!(form.tipos_documento[0].nombre, "DNI");
        assert!(form.ubicaciones.departamentos.is_empty());

        Ok(())
    }
}
