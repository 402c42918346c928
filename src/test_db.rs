//! Throwaway PostgreSQL databases for service tests.
//!
//! One container is started per test binary and shared. Every [`TestDb`] gets
//! its own freshly migrated database inside it, so tests never see each
//! other's rows and need no cleanup.

use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use diesel::{ExpressionMethods, QueryableByName, sql_types::BigInt};
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};
use rust_decimal::Decimal;
use testcontainers::{ContainerAsync, ImageExt, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres as PostgresImage;
use tokio::sync::OnceCell;

use crate::{
    core::{
        aliases::DbPool,
        config::DatabaseConfig,
        db::{self, MIGRATIONS},
    },
    models::{CreateBeverageEntity, CreateCustomerEntity, CreateFoodEntity},
    schema::{bebida, categoria, cliente, comida},
};

const USER: &str = "raices_test";
const PASSWORD: &str = "raices_test_password";

/// The container and its mapped port. The port is looked up once so later
/// tests, running on other runtimes, never talk to Docker.
static POSTGRES: OnceCell<(ContainerAsync<PostgresImage>, u16)> = OnceCell::const_new();

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

async fn start_postgres() -> (ContainerAsync<PostgresImage>, u16) {
    let container = PostgresImage::default()
        .with_user(USER)
        .with_password(PASSWORD)
        .with_db_name("raices_test")
        .with_env_var("POSTGRES_INITDB_ARGS", "--auth-host=trust")
        .start()
        .await
        .expect("Failed to start PostgreSQL container");

    let port = container
        .get_host_port_ipv4(5432)
        .await
        .expect("Failed to get container port");

    (container, port)
}

fn server_url(database: &str, port: u16) -> String {
    let host =
        std::env::var("TESTCONTAINERS_HOST_OVERRIDE").unwrap_or_else(|_| "localhost".to_string());

    format!("postgres://{USER}:{PASSWORD}@{host}:{port}/{database}")
}

#[derive(Clone)]
pub struct TestDb {
    pub pool: DbPool,
    pub name: String,
}

impl TestDb {
    /// Creates and migrates an isolated database.
    pub async fn new() -> Self {
        let (_, port) = POSTGRES.get_or_init(start_postgres).await;

        let name = format!(
            "raices_test_{}_{}",
            std::process::id(),
            NEXT_DB.fetch_add(1, Ordering::Relaxed)
        );

        let mut admin = AsyncPgConnection::establish(&server_url("postgres", *port))
            .await
            .expect("Failed to connect to the postgres database");
        diesel::sql_query(format!("CREATE DATABASE \"{name}\""))
            .execute(&mut admin)
            .await
            .expect("Failed to create test database");

        let url = server_url(&name, *port);

        db::run_migrations_blocking(MIGRATIONS, &url)
            .await
            .expect("Failed to run migrations on test database");

        let pool = db::create_pool(&DatabaseConfig {
            url,
            pool_max_size: 4,
            pool_timeout: Duration::from_secs(10),
        })
        .await
        .expect("Failed to build test pool");

        Self { pool, name }
    }

    pub async fn conn(
        &self,
    ) -> diesel_async::pooled_connection::bb8::PooledConnection<'_, AsyncPgConnection> {
        self.pool
            .get()
            .await
            .expect("Failed to get a test connection")
    }

    pub async fn customer(&self, usuario: &str) -> i32 {
        diesel::insert_into(cliente::table)
            .values(CreateCustomerEntity {
                nombre: "Ana".into(),
                apellido: "Quispe".into(),
                email: format!("{usuario}@raices.test"),
                usuario: usuario.into(),
                contrasena: "!".into(),
                telefono: Some("987654321".into()),
                direccion: None,
                tipo_documento_id: None,
                numero_documento: None,
                genero_id: None,
                distrito_id: None,
                ruc: None,
            })
            .returning(cliente::id)
            .get_result(&mut self.conn().await)
            .await
            .expect("Failed to insert customer")
    }

    pub async fn food(&self, nombre: &str, precio: Decimal) -> i32 {
        let conn = &mut self.conn().await;

        let categoria_id = diesel::insert_into(categoria::table)
            .values(categoria::nombre.eq("Fondos"))
            .returning(categoria::id)
            .get_result::<i32>(conn)
            .await
            .expect("Failed to insert category");

        diesel::insert_into(comida::table)
            .values(CreateFoodEntity {
                nombre: nombre.into(),
                descripcion: None,
                precio,
                categoria_id,
                imagen: None,
                disponible: true,
            })
            .returning(comida::id)
            .get_result(conn)
            .await
            .expect("Failed to insert food")
    }

    pub async fn beverage(&self, nombre: &str, precio: Decimal) -> i32 {
        diesel::insert_into(bebida::table)
            .values(CreateBeverageEntity {
                nombre: nombre.into(),
                descripcion: None,
                precio,
                tipo: "refresco".into(),
                tamano_ml: Some(500),
                imagen: None,
                disponible: true,
            })
            .returning(bebida::id)
            .get_result(&mut self.conn().await)
            .await
            .expect("Failed to insert beverage")
    }

    /// Row count of a table, for asserting on side effects.
    pub async fn count(&self, table: &str) -> i64 {
        diesel::sql_query(format!("SELECT COUNT(*) AS n FROM {table}"))
            .get_result::<RowCount>(&mut self.conn().await)
            .await
            .expect("Failed to count rows")
            .n
    }
}

#[derive(QueryableByName)]
struct RowCount {
    #[diesel(sql_type = BigInt)]
    n: i64,
}

#[cfg(test)]
mod tests {
    use testresult::TestResult;

    use super::*;

    #[tokio::test]
    async fn databases_are_isolated() -> TestResult {
        let first = TestDb::new().await;
        let second = TestDb::new().await;

        first.customer("ana").await;

        assert_ne!(first.name, second.name);
        assert_eq!(first.count("cliente").await, 1);
        assert_eq!(second.count("cliente").await, 0);

        Ok(())
    }
}
