use hyper::body::Bytes;
use hyper::header::{self, HeaderMap};
use hyper::{Method, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::AppState;
use super::error::{ApiError, HttpResponse, empty, json};
use super::params::{Kind, Params};
use crate::api::{Credentials, Listing, LoginResponse, Page};
use crate::book::{Book, PartyOwned};
use crate::core::aggregate::{category_totals, monthly_totals, within};
use crate::core::forecast::forecast_spending;
use crate::core::query::sort_transactions;
use crate::core::{
    Budget, BudgetStatus, Credit, Entity, Expense, Income, LedgerEntry, Note, Party,
    PeriodSummary, SavingsGoal, SavingsProgress, Task, Transaction, YearMonth,
};

const DEFAULT_PER_PAGE: usize = 20;

pub(super) fn dispatch(
    state: &AppState,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<HttpResponse, ApiError> {
    if *method == Method::OPTIONS {
        return Ok(empty(StatusCode::NO_CONTENT));
    }
    let segments: Vec<&str> = uri.path().split('/').filter(|s| !s.is_empty()).collect();
    match segments.as_slice() {
        ["health"] => {
            require_get(method)?;
            json(StatusCode::OK, &serde_json::json!({ "status": "ok" }))
        }
        ["api", "auth", action] => auth_route(state, method, action, headers, body),
        ["api", rest @ ..] => {
            if state.require_auth {
                let token = bearer(headers)?;
                state.auth().authenticate(token)?;
            }
            let params = Params::parse(uri.query())?;
            api_route(state, method, rest, &params, body)
        }
        _ => Err(not_found(uri.path())),
    }
}

fn auth_route(
    state: &AppState,
    method: &Method,
    action: &str,
    headers: &HeaderMap,
    body: &Bytes,
) -> Result<HttpResponse, ApiError> {
    match (method, action) {
        (&Method::POST, "register") => {
            let creds: Credentials = parse_body(body)?;
            let user = state.auth().register(&creds.username, &creds.password)?;
            json(StatusCode::CREATED, &user)
        }
        (&Method::POST, "login") => {
            let creds: Credentials = parse_body(body)?;
            let (token, user) = state.auth().login(&creds.username, &creds.password)?;
            json(StatusCode::OK, &LoginResponse { token, user })
        }
        (&Method::POST, "logout") => {
            let token = bearer(headers)?;
            state.auth().logout(token)?;
            Ok(empty(StatusCode::NO_CONTENT))
        }
        (&Method::GET, "me") => {
            let token = bearer(headers)?;
            let user = state.auth().authenticate(token)?;
            json(StatusCode::OK, &user)
        }
        (_, "register" | "login" | "logout" | "me") => Err(ApiError::MethodNotAllowed),
        _ => Err(not_found(action)),
    }
}

fn api_route(
    state: &AppState,
    method: &Method,
    segments: &[&str],
    params: &Params,
    body: &Bytes,
) -> Result<HttpResponse, ApiError> {
    match segments {
        ["summary"] => {
            require_get(method)?;
            let db = state.book().snapshot()?;
            json(StatusCode::OK, &PeriodSummary::compute(&db, params.month)?)
        }
        ["analytics", "categories"] => {
            require_get(method)?;
            let db = state.book().snapshot()?;
            let month = params.month;
            let totals = match params.kind.unwrap_or_default() {
                Kind::Expenses => category_totals(within(&db.expenses, month))?,
                Kind::Income => category_totals(within(&db.income, month))?,
            };
            json(StatusCode::OK, &totals)
        }
        ["analytics", "monthly"] => {
            require_get(method)?;
            let db = state.book().snapshot()?;
            let totals = match params.kind.unwrap_or_default() {
                Kind::Expenses => monthly_totals(&db.expenses)?,
                Kind::Income => monthly_totals(&db.income)?,
            };
            json(StatusCode::OK, &totals)
        }
        ["analytics", "forecast"] => {
            require_get(method)?;
            let reference = reference_month(params);
            let expenses = state.book().list::<Expense>()?;
            json(StatusCode::OK, &forecast_spending(&expenses, reference)?)
        }
        ["budgets", "status"] => {
            require_get(method)?;
            let reference = reference_month(params);
            let db = state.book().snapshot()?;
            let statuses = db
                .budgets
                .iter()
                .map(|b| b.status(&db.expenses, reference))
                .collect::<Result<Vec<BudgetStatus>, _>>()?;
            json(StatusCode::OK, &statuses)
        }
        ["savings-goals", "progress"] => {
            require_get(method)?;
            let today = Book::today();
            let goals = state.book().list::<SavingsGoal>()?;
            let progress = goals
                .iter()
                .map(|g| g.progress(today))
                .collect::<Result<Vec<SavingsProgress>, _>>()?;
            json(StatusCode::OK, &progress)
        }
        ["parties"] => match *method {
            Method::GET => listing(state.book().party_views()?, params),
            Method::POST => {
                let party: Party = parse_body(body)?;
                let mut book = state.book();
                let created = book.create(party)?;
                json(StatusCode::CREATED, &book.party_view(created.id)?)
            }
            _ => Err(ApiError::MethodNotAllowed),
        },
        ["parties", id] => {
            let id = parse_id(id)?;
            match *method {
                Method::GET => json(StatusCode::OK, &state.book().party_view(id)?),
                Method::PUT => {
                    let party: Party = parse_body(body)?;
                    let mut book = state.book();
                    book.update(id, party)?;
                    json(StatusCode::OK, &book.party_view(id)?)
                }
                Method::DELETE => {
                    state.book().delete_party(id)?;
                    Ok(empty(StatusCode::NO_CONTENT))
                }
                _ => Err(ApiError::MethodNotAllowed),
            }
        }
        ["parties", id, "ledger"] => {
            require_get(method)?;
            let id = parse_id(id)?;
            let filter = params.filter.unwrap_or_default();
            json(StatusCode::OK, &state.book().statement(id, filter)?)
        }
        ["parties", id, "entries"] => {
            let id = parse_id(id)?;
            match *method {
                Method::GET => listing(state.book().ledger_entries(id)?, params),
                Method::POST => {
                    let mut entry: LedgerEntry = parse_body(body)?;
                    entry.party_id = id;
                    json(StatusCode::CREATED, &state.book().create(entry)?)
                }
                _ => Err(ApiError::MethodNotAllowed),
            }
        }
        ["ledger-entries", id] => item::<LedgerEntry>(state, method, id, body),
        ["expenses"] => transactions::<Expense>(state, method, params, body),
        ["expenses", id] => item::<Expense>(state, method, id, body),
        ["income"] => transactions::<Income>(state, method, params, body),
        ["income", id] => item::<Income>(state, method, id, body),
        ["credits"] => collection::<Credit>(state, method, params, body),
        ["credits", id] => item::<Credit>(state, method, id, body),
        ["notes"] => collection::<Note>(state, method, params, body),
        ["notes", id] => item::<Note>(state, method, id, body),
        ["tasks"] => collection::<Task>(state, method, params, body),
        ["tasks", id] => item::<Task>(state, method, id, body),
        ["budgets"] => collection::<Budget>(state, method, params, body),
        ["budgets", id] => item::<Budget>(state, method, id, body),
        ["savings-goals"] => collection::<SavingsGoal>(state, method, params, body),
        ["savings-goals", id] => item::<SavingsGoal>(state, method, id, body),
        _ => Err(not_found(&format!("/api/{}", segments.join("/")))),
    }
}

fn collection<E: Entity + PartyOwned>(
    state: &AppState,
    method: &Method,
    params: &Params,
    body: &Bytes,
) -> Result<HttpResponse, ApiError> {
    match *method {
        Method::GET => listing(state.book().list::<E>()?, params),
        Method::POST => create::<E>(state, body),
        _ => Err(ApiError::MethodNotAllowed),
    }
}

/// Like [`collection`] but listing honours `q`, `sort` and `order`.
fn transactions<E: Entity + PartyOwned + Transaction>(
    state: &AppState,
    method: &Method,
    params: &Params,
    body: &Bytes,
) -> Result<HttpResponse, ApiError> {
    if *method != Method::GET {
        return collection::<E>(state, method, params, body);
    }
    let items = state.book().list::<E>()?;
    let mut matched = match &params.q {
        Some(query) => query.filter(&items),
        None => items.iter().collect(),
    };
    sort_transactions(
        &mut matched,
        params.sort.unwrap_or_default(),
        params.order.unwrap_or_default(),
    );
    let matched: Vec<E> = matched.into_iter().cloned().collect();
    listing(matched, params)
}

fn item<E: Entity + PartyOwned>(
    state: &AppState,
    method: &Method,
    id: &str,
    body: &Bytes,
) -> Result<HttpResponse, ApiError> {
    let id = parse_id(id)?;
    match *method {
        Method::GET => json(StatusCode::OK, &state.book().get::<E>(id)?),
        Method::PUT => {
            let record: E = parse_body(body)?;
            json(StatusCode::OK, &state.book().update(id, record)?)
        }
        Method::DELETE => {
            state.book().delete::<E>(id)?;
            Ok(empty(StatusCode::NO_CONTENT))
        }
        _ => Err(ApiError::MethodNotAllowed),
    }
}

fn create<E: Entity + PartyOwned>(state: &AppState, body: &Bytes) -> Result<HttpResponse, ApiError> {
    let record: E = parse_body(body)?;
    json(StatusCode::CREATED, &state.book().create(record)?)
}

/// Bare array, or a page object when `page` is given.
fn listing<T: Serialize>(items: Vec<T>, params: &Params) -> Result<HttpResponse, ApiError> {
    let listing = match params.page {
        Some(page) => {
            let per_page = params.per_page.unwrap_or(DEFAULT_PER_PAGE);
            Listing::Paged(Page::from_items(items, page, per_page))
        }
        None => Listing::All(items),
    };
    json(StatusCode::OK, &listing)
}

fn reference_month(params: &Params) -> YearMonth {
    params.month.unwrap_or_else(|| YearMonth::of(Book::today()))
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| ApiError::BadRequest(format!("invalid body: {e}")))
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::NotFound(format!("no record with id {id}")))
}

fn bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::Unauthorized("missing bearer token".into()))
}

fn require_get(method: &Method) -> Result<(), ApiError> {
    if *method == Method::GET {
        Ok(())
    } else {
        Err(ApiError::MethodNotAllowed)
    }
}

fn not_found(path: &str) -> ApiError {
    ApiError::NotFound(format!("no route for {path}"))
}
