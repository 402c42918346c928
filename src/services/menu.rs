//! Public menu reads and the back-office menu writes.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use diesel::{
    BelongingToDsl, ExpressionMethods, GroupedBy, OptionalExtension, QueryDsl, Queryable,
    SelectableHelper,
};
use diesel_async::{AsyncPgConnection, RunQueryDsl};
use mockall::automock;
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    core::aliases::DbPool,
    domain::{ProductKind, receipt::MAX_AMOUNT},
    models::{
        BeverageEntity, CategoryEntity, CreateBeverageEntity, CreateFoodEntity, FoodEntity,
        PromotionEntity, PromotionItemEntity, UpdateBeverageEntity, UpdateFoodEntity,
    },
    schema::{bebida, categoria, comida, promocion_items, promociones},
    services::ServiceError,
};

/// Food row with the name of its category.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct FoodView {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub imagen: Option<String>,
    pub disponible: bool,
    pub categoria_id: i32,
    pub categoria: String,
}

/// Beverage row; `categoria` is the beverage type column.
#[derive(Queryable, Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct BeverageView {
    pub id: i32,
    pub nombre: String,
    pub descripcion: Option<String>,
    pub precio: Decimal,
    pub imagen: Option<String>,
    pub disponible: bool,
    pub categoria: String,
    pub tamano_ml: Option<i32>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
#[serde(tag = "tipo", rename_all = "lowercase")]
pub enum MenuItem {
    Comida(FoodView),
    Bebida(BeverageView),
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct PromotionItemView {
    pub tipo: ProductKind,
    pub producto_id: i32,
    pub cantidad: i32,
    pub nombre: String,
    pub precio: Decimal,
    pub imagen: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq, ToSchema)]
pub struct PromotionView {
    #[serde(flatten)]
    pub promotion: PromotionEntity,
    pub items: Vec<PromotionItemView>,
}

type PricedRow = (i32, String, Decimal, Option<String>);

fn validate_price(precio: Decimal) -> Result<(), ServiceError> {
    if precio.is_sign_negative() {
        return Err(ServiceError::Validation(
            "El precio no puede ser negativo".into(),
        ));
    }
    if precio > MAX_AMOUNT {
        return Err(ServiceError::Validation(
            "El precio excede el máximo permitido".into(),
        ));
    }

    Ok(())
}

fn validate_item(nombre: &str, precio: Decimal) -> Result<(), ServiceError> {
    if nombre.trim().is_empty() {
        return Err(ServiceError::Validation("El nombre es obligatorio".into()));
    }

    validate_price(precio)
}

fn no_changes() -> ServiceError {
    ServiceError::Validation("No se enviaron campos para actualizar".into())
}

async fn load_foods(
    conn: &mut AsyncPgConnection,
    only_available: bool,
) -> Result<Vec<FoodView>, ServiceError> {
    let mut query = comida::table
        .inner_join(categoria::table)
        .order(comida::id.asc())
        .select((
            comida::id,
            comida::nombre,
            comida::descripcion,
            comida::precio,
            comida::imagen,
            comida::disponible,
            comida::categoria_id,
            categoria::nombre,
        ))
        .into_boxed();

    if only_available {
        query = query.filter(comida::disponible.eq(true));
    }

    Ok(query.load::<FoodView>(conn).await?)
}

async fn load_beverages(
    conn: &mut AsyncPgConnection,
    only_available: bool,
) -> Result<Vec<BeverageView>, ServiceError> {
    let mut query = bebida::table
        .order(bebida::id.asc())
        .select((
            bebida::id,
            bebida::nombre,
            bebida::descripcion,
            bebida::precio,
            bebida::imagen,
            bebida::disponible,
            bebida::tipo,
            bebida::tamano_ml,
        ))
        .into_boxed();

    if only_available {
        query = query.filter(bebida::disponible.eq(true));
    }

    Ok(query.load::<BeverageView>(conn).await?)
}

/// Name, price and image of the products referenced by promotion items.
async fn priced_products(
    conn: &mut AsyncPgConnection,
    items: &[PromotionItemEntity],
) -> Result<HashMap<(ProductKind, i32), (String, Decimal, Option<String>)>, ServiceError> {
    let mut ids: HashMap<ProductKind, Vec<i32>> = HashMap::new();
    for item in items {
        match item.tipo.parse::<ProductKind>() {
            Ok(kind) => ids.entry(kind).or_default().push(item.item_id),
            Err(_) => tracing::warn!(
                "Promotion item #{} has unknown kind '{}'",
                item.id,
                item.tipo
            ),
        }
    }

    let mut products = HashMap::new();
    for (kind, ids) in ids {
        let rows: Vec<PricedRow> = match kind {
            ProductKind::Comida => {
                comida::table
                    .filter(comida::id.eq_any(&ids))
                    .select((comida::id, comida::nombre, comida::precio, comida::imagen))
                    .load(conn)
                    .await?
            }
            ProductKind::Bebida => {
                bebida::table
                    .filter(bebida::id.eq_any(&ids))
                    .select((bebida::id, bebida::nombre, bebida::precio, bebida::imagen))
                    .load(conn)
                    .await?
            }
            ProductKind::Promocion => {
                promociones::table
                    .filter(promociones::id.eq_any(&ids))
                    .select((
                        promociones::id,
                        promociones::titulo,
                        promociones::precio_oferta,
                        promociones::imagen,
                    ))
                    .load(conn)
                    .await?
            }
        };

        products.extend(
            rows.into_iter()
                .map(|(id, nombre, precio, imagen)| ((kind, id), (nombre, precio, imagen))),
        );
    }

    Ok(products)
}

#[derive(Debug, Clone)]
pub struct PgMenuService {
    db_pool: DbPool,
}

impl PgMenuService {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl MenuService for PgMenuService {
    async fn full_menu(&self) -> Result<Vec<MenuItem>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let foods = load_foods(conn, true).await?;
        let beverages = load_beverages(conn, true).await?;

        Ok(foods
            .into_iter()
            .map(MenuItem::Comida)
            .chain(beverages.into_iter().map(MenuItem::Bebida))
            .collect())
    }

    async fn categories(&self) -> Result<Vec<CategoryEntity>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let categories = categoria::table
            .order(categoria::id.asc())
            .select(CategoryEntity::as_select())
            .load(conn)
            .await?;

        Ok(categories)
    }

    async fn foods(&self) -> Result<Vec<FoodView>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        load_foods(conn, true).await
    }

    async fn food(&self, id: i32) -> Result<FoodView, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        comida::table
            .inner_join(categoria::table)
            .filter(comida::id.eq(id))
            .select((
                comida::id,
                comida::nombre,
                comida::descripcion,
                comida::precio,
                comida::imagen,
                comida::disponible,
                comida::categoria_id,
                categoria::nombre,
            ))
            .first::<FoodView>(conn)
            .await
            .optional()?
            .ok_or(ServiceError::ProductNotFound)
    }

    async fn beverages(&self) -> Result<Vec<BeverageView>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        load_beverages(conn, true).await
    }

    async fn beverage(&self, id: i32) -> Result<BeverageView, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        bebida::table
            .find(id)
            .select((
                bebida::id,
                bebida::nombre,
                bebida::descripcion,
                bebida::precio,
                bebida::imagen,
                bebida::disponible,
                bebida::tipo,
                bebida::tamano_ml,
            ))
            .first::<BeverageView>(conn)
            .await
            .optional()?
            .ok_or(ServiceError::ProductNotFound)
    }

    async fn menu_item(&self, id: i32) -> Result<MenuItem, ServiceError> {
        match self.food(id).await {
            Ok(food) => return Ok(MenuItem::Comida(food)),
            Err(ServiceError::ProductNotFound) => {}
            Err(err) => return Err(err),
        }

        self.beverage(id).await.map(MenuItem::Bebida)
    }

    async fn promotions(&self) -> Result<Vec<PromotionView>, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let promotions: Vec<PromotionEntity> = promociones::table
            .filter(promociones::activo.eq(true))
            .order(promociones::id.asc())
            .select(PromotionEntity::as_select())
            .load(conn)
            .await?;

        let items: Vec<PromotionItemEntity> = PromotionItemEntity::belonging_to(&promotions)
            .order(promocion_items::id.asc())
            .select(PromotionItemEntity::as_select())
            .load(conn)
            .await?;

        let products = priced_products(conn, &items).await?;

        Ok(items
            .grouped_by(&promotions)
            .into_iter()
            .zip(promotions)
            .map(|(items, promotion)| PromotionView {
                items: items
                    .into_iter()
                    .filter_map(|item| {
                        let kind = item.tipo.parse::<ProductKind>().ok()?;
                        let (nombre, precio, imagen) =
                            products.get(&(kind, item.item_id)).cloned()?;
                        Some(PromotionItemView {
                            tipo: kind,
                            producto_id: item.item_id,
                            cantidad: item.cantidad,
                            nombre,
                            precio,
                            imagen,
                        })
                    })
                    .collect(),
                promotion,
            })
            .collect())
    }

    async fn create_food(&self, food: CreateFoodEntity) -> Result<FoodEntity, ServiceError> {
        validate_item(&food.nombre, food.precio)?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let food = diesel::insert_into(comida::table)
            .values(food)
            .returning(FoodEntity::as_returning())
            .get_result(conn)
            .await?;

        tracing::info!("Created food #{} ({})", food.id, food.nombre);

        Ok(food)
    }

    async fn update_food(
        &self,
        id: i32,
        changes: UpdateFoodEntity,
    ) -> Result<FoodEntity, ServiceError> {
        if changes == UpdateFoodEntity::default() {
            return Err(no_changes());
        }
        if let Some(precio) = changes.precio {
            validate_price(precio)?;
        }

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::update(comida::table.find(id))
            .set(&changes)
            .returning(FoodEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .ok_or(ServiceError::ProductNotFound)
    }

    async fn disable_food(&self, id: i32) -> Result<FoodEntity, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let food = diesel::update(comida::table.find(id))
            .set(comida::disponible.eq(false))
            .returning(FoodEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .ok_or(ServiceError::ProductNotFound)?;

        tracing::info!("Food #{id} is no longer available");

        Ok(food)
    }

    async fn create_beverage(
        &self,
        beverage: CreateBeverageEntity,
    ) -> Result<BeverageEntity, ServiceError> {
        validate_item(&beverage.nombre, beverage.precio)?;

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let beverage = diesel::insert_into(bebida::table)
            .values(beverage)
            .returning(BeverageEntity::as_returning())
            .get_result(conn)
            .await?;

        tracing::info!("Created beverage #{} ({})", beverage.id, beverage.nombre);

        Ok(beverage)
    }

    async fn update_beverage(
        &self,
        id: i32,
        changes: UpdateBeverageEntity,
    ) -> Result<BeverageEntity, ServiceError> {
        if changes == UpdateBeverageEntity::default() {
            return Err(no_changes());
        }
        if let Some(precio) = changes.precio {
            validate_price(precio)?;
        }

        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        diesel::update(bebida::table.find(id))
            .set(&changes)
            .returning(BeverageEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .ok_or(ServiceError::ProductNotFound)
    }

    async fn disable_beverage(&self, id: i32) -> Result<BeverageEntity, ServiceError> {
        let conn = &mut self
            .db_pool
            .get()
            .await
            .context("Failed to obtain a DB connection pool")?;

        let beverage = diesel::update(bebida::table.find(id))
            .set(bebida::disponible.eq(false))
            .returning(BeverageEntity::as_returning())
            .get_result(conn)
            .await
            .optional()?
            .ok_or(ServiceError::ProductNotFound)?;

        tracing::info!("Beverage #{id} is no longer available");

        Ok(beverage)
    }
}

#[automock]
#[async_trait]
pub trait MenuService: Send + Sync {
    /// Available food followed by available beverages, each tagged with its
    /// product kind.
    async fn full_menu(&self) -> Result<Vec<MenuItem>, ServiceError>;

    async fn categories(&self) -> Result<Vec<CategoryEntity>, ServiceError>;

    async fn foods(&self) -> Result<Vec<FoodView>, ServiceError>;

    async fn food(&self, id: i32) -> Result<FoodView, ServiceError>;

    async fn beverages(&self) -> Result<Vec<BeverageView>, ServiceError>;

    async fn beverage(&self, id: i32) -> Result<BeverageView, ServiceError>;

    /// Food with this id, else the beverage with this id.
    async fn menu_item(&self, id: i32) -> Result<MenuItem, ServiceError>;

    /// Active promotions with their resolved items. Items pointing at
    /// missing products are left out.
    async fn promotions(&self) -> Result<Vec<PromotionView>, ServiceError>;

    async fn create_food(&self, food: CreateFoodEntity) -> Result<FoodEntity, ServiceError>;

    async fn update_food(
        &self,
        id: i32,
        changes: UpdateFoodEntity,
    ) -> Result<FoodEntity, ServiceError>;

    /// Soft delete: the row stays for past orders.
    async fn disable_food(&self, id: i32) -> Result<FoodEntity, ServiceError>;

    async fn create_beverage(
        &self,
        beverage: CreateBeverageEntity,
    ) -> Result<BeverageEntity, ServiceError>;

    async fn update_beverage(
        &self,
        id: i32,
        changes: UpdateBeverageEntity,
    ) -> Result<BeverageEntity, ServiceError>;

    async fn disable_beverage(&self, id: i32) -> Result<BeverageEntity, ServiceError>;
}
