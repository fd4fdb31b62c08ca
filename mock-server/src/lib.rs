//! In-memory stand-in for the drinks catalog API.
//!
//! Speaks the client's wire grammar: `/<resource>/[key/value/]*` with `appId`,
//! `lang`, `pageSize`, `start`, `quickSearch`, `find`, `like` and `callback`
//! query parameters. When `callback` is present the body is a JSONP call.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::{debug, info};
use uuid::Uuid;

pub mod seed;

pub struct Catalog {
    resources: HashMap<String, Vec<Value>>,
    collections: HashMap<String, Value>,
}

impl Catalog {
    pub fn seeded() -> Self {
        Self {
            resources: seed::resources(),
            collections: HashMap::new(),
        }
    }

    fn list(&self, resource: &str) -> Option<&Vec<Value>> {
        self.resources.get(resource)
    }

    fn drink(&self, id: &str) -> Option<&Value> {
        self.list("drinks")?.iter().find(|d| d["id"] == id)
    }
}

pub type Db = Arc<RwLock<Catalog>>;

type Params = HashMap<String, String>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Catalog::seeded()));
    Router::new().route("/{*path}", get(handle)).with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn handle(State(db): State<Db>, Path(path): Path<String>, Query(params): Query<Params>) -> Response {
    info!(%path, "catalog request");
    if params.get("appId").is_none_or(|id| id.is_empty()) {
        return (StatusCode::FORBIDDEN, "missing appId").into_response();
    }

    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    let outcome = match segments.split_first() {
        Some((&"usercollections", rest)) => collections(&db, rest, &params).await,
        Some((resource, rest)) => query(&*db.read().await, resource, rest, &params),
        None => Err(StatusCode::NOT_FOUND),
    };
    let (status, body) = match outcome {
        Ok(body) => (StatusCode::OK, body),
        Err(status) => (
            status,
            json!({ "error": status.canonical_reason().unwrap_or("error") }),
        ),
    };
    render(status, body, params.get("callback"))
}

fn render(status: StatusCode, body: Value, callback: Option<&String>) -> Response {
    match callback {
        Some(callback) => {
            debug!(%callback, "wrapping response as JSONP");
            (
                status,
                [(header::CONTENT_TYPE, "application/javascript")],
                format!("{callback}({body});"),
            )
                .into_response()
        }
        None => (status, [(header::CONTENT_TYPE, "application/json")], body.to_string()).into_response(),
    }
}

fn query(catalog: &Catalog, resource: &str, rest: &[&str], params: &Params) -> Result<Value, StatusCode> {
    let items = catalog.list(resource).ok_or(StatusCode::NOT_FOUND)?;

    if resource == "drinks" {
        match rest {
            [id, "howtomix"] => return how_to_mix(catalog, id),
            [id] if !is_drink_filter(id) => return single(items, id),
            _ => {}
        }
    } else if let [id] = rest {
        return single(items, id);
    }

    let mut matching: Vec<&Value> = items.iter().collect();
    for pair in rest.chunks(2) {
        if let [key, value] = pair {
            matching.retain(|item| matches_filter(item, key, value));
        }
    }
    if let Some(text) = params.get("quickSearch") {
        let needle = text.to_lowercase();
        matching.retain(|item| {
            item["name"]
                .as_str()
                .is_some_and(|name| name.to_lowercase().contains(&needle))
        });
    }
    if let Some(find) = params.get("find") {
        let clauses = parse_find(find);
        matching.retain(|item| clauses.iter().all(|(field, value)| field_equals(item, field, value)));
    }
    if let Some(like) = params.get("like") {
        let reference = catalog.drink(like).ok_or(StatusCode::NOT_FOUND)?;
        matching.retain(|item| item["id"] != reference["id"] && shares_ingredient(item, reference));
    }
    Ok(page(matching, params))
}

fn single(items: &[Value], id: &str) -> Result<Value, StatusCode> {
    items
        .iter()
        .find(|item| item["id"] == id)
        .cloned()
        .ok_or(StatusCode::NOT_FOUND)
}

fn how_to_mix(catalog: &Catalog, id: &str) -> Result<Value, StatusCode> {
    let drink = catalog.drink(id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(json!({
        "id": drink["id"],
        "steps": drink["ingredients"]
            .as_array()
            .map(|ings| ings.iter().map(|i| json!({ "ingredient": i })).collect::<Vec<_>>())
            .unwrap_or_default(),
    }))
}

fn page(items: Vec<&Value>, params: &Params) -> Value {
    let start: usize = params.get("start").and_then(|s| s.parse().ok()).unwrap_or(0);
    let size: usize = params.get("pageSize").and_then(|s| s.parse().ok()).unwrap_or(25);
    let total = items.len();
    let result: Vec<Value> = items.into_iter().skip(start).take(size).cloned().collect();
    json!({ "totalResult": total, "result": result })
}

fn is_drink_filter(segment: &str) -> bool {
    matches!(
        segment,
        "with" | "withtype" | "for" | "madeWith" | "tasting" | "oftype" | "rating" | "servedin"
            | "alcoholic" | "carbonated" | "video" | "skill"
    )
}

/// `value` may combine ids with ` or ` / ` and `.
fn matches_filter(item: &Value, key: &str, value: &str) -> bool {
    let list_field = match key {
        "with" => "ingredients",
        "for" => "occasions",
        "madeWith" => "tools",
        "tasting" => "tastes",
        "alcoholic" => return yes_no(item, "isAlcoholic", value),
        "carbonated" => return yes_no(item, "isCarbonated", value),
        "video" => return yes_no(item, "hasVideo", value),
        "servedin" => return item["servedIn"] == value,
        "skill" => return item["skill"] == value,
        "bydrinks" => return item["drink"] == value,
        _ => return true,
    };
    let has = |id: &str| {
        item[list_field]
            .as_array()
            .is_some_and(|ids| ids.iter().any(|v| v == id))
    };
    if value.contains(" or ") {
        value.split(" or ").any(|id| has(id.trim()))
    } else {
        value.split(" and ").all(|id| has(id.trim()))
    }
}

fn yes_no(item: &Value, field: &str, value: &str) -> bool {
    item[field].as_bool() == Some(value == "yes")
}

fn parse_find(find: &str) -> Vec<(String, String)> {
    find.split(" AND ")
        .filter_map(|clause| clause.split_once(':'))
        .map(|(field, value)| (field.to_string(), value.to_string()))
        .collect()
}

fn field_equals(item: &Value, field: &str, value: &str) -> bool {
    let Some(map) = item.as_object() else {
        return false;
    };
    map.iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(field))
        .is_some_and(|(_, v)| match v {
            Value::String(s) => s.eq_ignore_ascii_case(value),
            other => other.to_string() == value,
        })
}

fn shares_ingredient(a: &Value, b: &Value) -> bool {
    let (Some(xs), Some(ys)) = (a["ingredients"].as_array(), b["ingredients"].as_array()) else {
        return false;
    };
    xs.iter().any(|x| ys.contains(x))
}

async fn collections(db: &Db, rest: &[&str], params: &Params) -> Result<Value, StatusCode> {
    let drink_list = || -> Vec<Value> {
        params
            .get("drinklist")
            .map(|list| list.split(',').filter(|s| !s.is_empty()).map(|s| json!(s)).collect())
            .unwrap_or_default()
    };

    match rest {
        ["create"] => {
            let name = params.get("name").ok_or(StatusCode::BAD_REQUEST)?;
            let id = Uuid::new_v4().to_string();
            let collection = json!({ "id": id, "name": name, "drinks": drink_list() });
            db.write().await.collections.insert(id, collection.clone());
            Ok(collection)
        }
        [id, "update"] => {
            let mut catalog = db.write().await;
            let collection = catalog.collections.get_mut(*id).ok_or(StatusCode::NOT_FOUND)?;
            if let Some(name) = params.get("name") {
                collection["name"] = json!(name);
            }
            let drinks = drink_list();
            if !drinks.is_empty() {
                collection["drinks"] = Value::Array(drinks);
            }
            Ok(collection.clone())
        }
        [id, "delete"] => {
            let removed = db.write().await.collections.remove(*id);
            removed
                .map(|_| json!({ "id": id, "deleted": true }))
                .ok_or(StatusCode::NOT_FOUND)
        }
        [id, "flipside"] => {
            let catalog = db.read().await;
            let collection = catalog.collections.get(*id).ok_or(StatusCode::NOT_FOUND)?;
            let owned: Vec<&Value> = collection["drinks"]
                .as_array()
                .map(|ids| ids.iter().filter_map(|d| d.as_str()).filter_map(|d| catalog.drink(d)).collect())
                .unwrap_or_default();
            let drinks = catalog.list("drinks").ok_or(StatusCode::NOT_FOUND)?;
            let flipside: Vec<&Value> = drinks
                .iter()
                .filter(|d| !owned.iter().any(|o| o["id"] == d["id"]))
                .filter(|d| owned.iter().any(|o| shares_ingredient(d, o)))
                .collect();
            Ok(page(flipside, params))
        }
        [id] => {
            let catalog = db.read().await;
            catalog.collections.get(*id).cloned().ok_or(StatusCode::NOT_FOUND)
        }
        [] => {
            let catalog = db.read().await;
            Ok(page(catalog.collections.values().collect(), params))
        }
        _ => Err(StatusCode::NOT_FOUND),
    }
}
