use actix_multipart::Multipart;
use actix_web::{delete, get, post, put, web, HttpResponse};
use log::error;
use serde_json::json;
use validator::Validate;

use crate::{
    app_data::AppData,
    app_error::{AppError, Response},
    services::*,
    upload::PokemonForm,
};

pub fn route(cfg: &mut web::ServiceConfig) {
    cfg.service(hello)
        .service(get_pokemons)
        .service(get_pokemons_by_page)
        .service(get_pokemon)
        .service(get_pokemon_by_name)
        .service(create_pokemon)
        .service(update_pokemon)
        .service(delete_pokemon)
        .service(goodbye);
}

/// JSON body extractor settings: malformed bodies are client errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::bad_request(err.to_string()).into())
}

#[get("/")]
async fn hello() -> &'static str {
    "Hello, World!"
}

#[get("/goodbye")]
async fn goodbye() -> &'static str {
    "Goodbye Moon Man!"
}

#[get("/pokemons")]
async fn get_pokemons(st: web::Data<AppData>) -> Response {
    let result = PokemonService::find_all(&st.context).await?;
    Ok(HttpResponse::Ok().json(result))
}

#[get("/pokemonsByPage/{page}")]
async fn get_pokemons_by_page(page: web::Path<String>, st: web::Data<AppData>) -> Response {
    // a page that is not a number matches nothing
    let result = match page.parse::<u64>() {
        Ok(page) => PokemonService::find_page(Page(page), &st.context).await?,
        Err(_) => Vec::new(),
    };
    Ok(HttpResponse::Ok().json(result))
}

#[get("/pokemons/{id}")]
async fn get_pokemon(id: web::Path<String>, st: web::Data<AppData>) -> Response {
    let id = id.parse::<i64>().map_err(|_| AppError::pokemon_not_found())?;
    find_one(PokemonQuery::ById(id), &st).await
}

#[get("/pokemonByName/{name}")]
async fn get_pokemon_by_name(name: web::Path<String>, st: web::Data<AppData>) -> Response {
    find_one(PokemonQuery::ByEnglishName(name.into_inner()), &st).await
}

async fn find_one(query: PokemonQuery, st: &AppData) -> Response {
    match PokemonService::find_one(query, &st.context).await? {
        Some(pokemon) => Ok(HttpResponse::Ok().json(pokemon)),
        None => Err(AppError::pokemon_not_found()),
    }
}

#[post("/pokemonCreate")]
async fn create_pokemon(payload: Multipart, st: web::Data<AppData>) -> Response {
    let mut form = PokemonForm::read(payload, &st.uploads).await?;
    let staged = form
        .image
        .take()
        .ok_or_else(|| AppError::bad_request("No image uploaded"))?;
    let mut input = match form.parse() {
        Ok(input) => input,
        Err(err) => {
            st.uploads.discard(&staged).await;
            return Err(err);
        }
    };
    let stored = st.uploads.promote(staged).await?;
    input.image = Some(st.uploads.public_url(&stored));
    match PokemonService::create(input, &st.context).await {
        Ok(pokemon) => Ok(HttpResponse::Created().json(pokemon)),
        Err(err) => {
            error!("Error creating Pokemon: {:#}", err);
            st.uploads.remove(&stored).await;
            Err(AppError::Internal(err))
        }
    }
}

#[put("/pokemonUpdate/{name}")]
async fn update_pokemon(
    name: web::Path<String>,
    body: web::Json<PokemonInput>,
    st: web::Data<AppData>,
) -> Response {
    let input = body.into_inner();
    input.validate()?;
    match PokemonService::replace(&name, input, &st.context).await? {
        Some(pokemon) => Ok(HttpResponse::Ok().json(pokemon)),
        None => Err(AppError::pokemon_not_found()),
    }
}

#[delete("/pokemonDelete/{name}")]
async fn delete_pokemon(name: web::Path<String>, st: web::Data<AppData>) -> Response {
    match PokemonService::delete(&name, &st.context).await? {
        Some(pokemon) => Ok(HttpResponse::Ok().json(json!({
            "message": "Pokemon deleted",
            "pokemon": pokemon,
        }))),
        None => Err(AppError::pokemon_not_found()),
    }
}
