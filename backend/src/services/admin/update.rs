use super::{apply, AdminError};
use crate::config::AppConfig;
use actix_web::{web, Responder};
use common::model::content::ContentUpdate;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

pub(crate) async fn process(
    config: web::Data<AppConfig>,
    payload: web::Json<ContentUpdate>,
) -> impl Responder {
    let update = payload.into_inner();
    apply(&config, "Content updated successfully", move |conn| {
        update_content(conn, &update)
    })
    .await
}

/// Sets the fields present in `update`. A blank category counts as absent.
pub(crate) fn update_content(conn: &mut Connection, update: &ContentUpdate) -> Result<(), AdminError> {
    let mut assignments = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(views) = update.views {
        assignments.push("views = ?");
        values.push(Value::Integer(views));
    }
    if let Some(category) = update.category.as_deref().filter(|c| !c.is_empty()) {
        assignments.push("category = ?");
        values.push(Value::Text(category.to_string()));
    }
    if let Some(likes) = update.likes {
        assignments.push("likes = ?");
        values.push(Value::Integer(likes));
    }
    if assignments.is_empty() {
        return Err(AdminError::NoFields);
    }
    values.push(Value::Text(update.content_id.clone()));

    let sql = format!(
        "UPDATE Content SET {} WHERE content_id = ?",
        assignments.join(", ")
    );
    let changed = conn.execute(&sql, params_from_iter(values))?;
    if changed == 0 {
        return Err(AdminError::NotFound);
    }
    Ok(())
}
