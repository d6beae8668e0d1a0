/// Hero Catalog Routes
///
/// Reads are public; create, update and delete sit behind the JWT middleware.

use actix_web::{web, HttpResponse};

use crate::domain::{HeroFilter, HeroRequest};
use crate::error::{AppError, ValidationError};
use crate::store::HeroStore;

fn hero_not_found(id: i64) -> AppError {
    AppError::not_found(format!("Hero with id {} not found", id))
}

/// GET /api/heroes?role=&name=
pub async fn list_heroes(
    query: web::Query<HeroFilter>,
    store: web::Data<dyn HeroStore>,
) -> Result<HttpResponse, AppError> {
    let filter = query.into_inner().normalized();
    let heroes = store.list(&filter).await?;

    Ok(HttpResponse::Ok().json(heroes))
}

/// GET /api/heroes/{id}
pub async fn get_hero(
    path: web::Path<i64>,
    store: web::Data<dyn HeroStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let hero = store.get(id).await?.ok_or_else(|| hero_not_found(id))?;

    Ok(HttpResponse::Ok().json(hero))
}

/// POST /api/heroes
pub async fn create_hero(
    body: web::Json<HeroRequest>,
    store: web::Data<dyn HeroStore>,
) -> Result<HttpResponse, AppError> {
    let new_hero = body.into_inner().validate()?;
    let hero = store.create(&new_hero).await?;

    tracing::info!(hero_id = hero.id, "Hero created");

    Ok(HttpResponse::Created()
        .insert_header(("Location", format!("/api/heroes/{}", hero.id)))
        .json(hero))
}

/// PUT /api/heroes/{id}
///
/// Replaces the hero and its whole ability list. An `id` in the body must
/// match the path.
pub async fn update_hero(
    path: web::Path<i64>,
    body: web::Json<HeroRequest>,
    store: web::Data<dyn HeroStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    let request = body.into_inner();

    if request.id.map_or(false, |body_id| body_id != id) {
        return Err(ValidationError::InvalidFormat("id does not match the path".to_string()).into());
    }

    let new_hero = request.validate()?;
    if !store.update(id, &new_hero).await? {
        return Err(hero_not_found(id));
    }

    tracing::info!(hero_id = id, "Hero updated");

    Ok(HttpResponse::NoContent().finish())
}

/// DELETE /api/heroes/{id}
pub async fn delete_hero(
    path: web::Path<i64>,
    store: web::Data<dyn HeroStore>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !store.delete(id).await? {
        return Err(hero_not_found(id));
    }

    tracing::info!(hero_id = id, "Hero deleted");

    Ok(HttpResponse::NoContent().finish())
}
