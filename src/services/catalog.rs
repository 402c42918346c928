//! Product lookups shared by the cart, checkout and order queries. Every
//! query branches on [`ProductKind`] so each kind reads its own table.

use std::collections::HashMap;

use diesel::{ExpressionMethods, OptionalExtension, QueryDsl, QueryResult};
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::{
    domain::ProductKind,
    schema::{bebida, comida, promociones},
};

/// Live display fields of a catalogue row.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProductSummary {
    pub nombre: String,
    pub imagen: Option<String>,
    pub descripcion: Option<String>,
}

type SummaryRow = (i32, String, Option<String>, Option<String>);

fn into_map(rows: Vec<SummaryRow>) -> HashMap<i32, ProductSummary> {
    rows.into_iter()
        .map(|(id, nombre, imagen, descripcion)| {
            (
                id,
                ProductSummary {
                    nombre,
                    imagen,
                    descripcion,
                },
            )
        })
        .collect()
}

/// Whether a product can be put in a cart. Promotions must also be active.
pub async fn product_exists(
    conn: &mut AsyncPgConnection,
    kind: ProductKind,
    id: i32,
) -> QueryResult<bool> {
    let found = match kind {
        ProductKind::Comida => {
            comida::table
                .find(id)
                .select(comida::id)
                .first::<i32>(conn)
                .await
        }
        ProductKind::Bebida => {
            bebida::table
                .find(id)
                .select(bebida::id)
                .first::<i32>(conn)
                .await
        }
        ProductKind::Promocion => {
            promociones::table
                .find(id)
                .filter(promociones::activo.eq(true))
                .select(promociones::id)
                .first::<i32>(conn)
                .await
        }
    };

    Ok(found.optional()?.is_some())
}

/// Display fields for `ids` of a single kind. Missing rows are absent from
/// the map.
pub async fn summaries(
    conn: &mut AsyncPgConnection,
    kind: ProductKind,
    ids: &[i32],
) -> QueryResult<HashMap<i32, ProductSummary>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let rows: Vec<SummaryRow> = match kind {
        ProductKind::Comida => {
            comida::table
                .filter(comida::id.eq_any(ids))
                .select((comida::id, comida::nombre, comida::imagen, comida::descripcion))
                .load(conn)
                .await?
        }
        ProductKind::Bebida => {
            bebida::table
                .filter(bebida::id.eq_any(ids))
                .select((bebida::id, bebida::nombre, bebida::imagen, bebida::descripcion))
                .load(conn)
                .await?
        }
        ProductKind::Promocion => {
            promociones::table
                .filter(promociones::id.eq_any(ids))
                .select((
                    promociones::id,
                    promociones::titulo,
                    promociones::imagen,
                    promociones::descripcion,
                ))
                .load(conn)
                .await?
        }
    };

    Ok(into_map(rows))
}

/// Display fields for a mixed set of product references.
pub async fn summaries_for(
    conn: &mut AsyncPgConnection,
    refs: impl IntoIterator<Item = (ProductKind, i32)>,
) -> QueryResult<HashMap<(ProductKind, i32), ProductSummary>> {
    let mut ids_by_kind: HashMap<ProductKind, Vec<i32>> = HashMap::new();
    for (kind, id) in refs {
        ids_by_kind.entry(kind).or_default().push(id);
    }

    let mut found = HashMap::new();
    for kind in ProductKind::ALL {
        let Some(ids) = ids_by_kind.get(&kind) else {
            continue;
        };

        for (id, summary) in summaries(conn, kind, ids).await? {
            found.insert((kind, id), summary);
        }
    }

    Ok(found)
}

/// Display name of one product, falling back to the kind's generic label.
pub async fn display_name(
    conn: &mut AsyncPgConnection,
    kind: ProductKind,
    id: i32,
) -> QueryResult<String> {
    let name = match kind {
        ProductKind::Comida => {
            comida::table
                .find(id)
                .select(comida::nombre)
                .first::<String>(conn)
                .await
        }
        ProductKind::Bebida => {
            bebida::table
                .find(id)
                .select(bebida::nombre)
                .first::<String>(conn)
                .await
        }
        ProductKind::Promocion => {
            promociones::table
                .find(id)
                .select(promociones::titulo)
                .first::<String>(conn)
                .await
        }
    };

    Ok(name
        .optional()?
        .unwrap_or_else(|| kind.fallback_name().to_string()))
}
