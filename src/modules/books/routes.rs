//! HTTP handlers for the books module, mounted under `/api/books`.

use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use library_http::error::AppError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::models::{Book, BookDto};
use super::service::{BookService, CostSummary};
use crate::modules::users::models::User;

type ApiResult<T> = Result<Json<T>, AppError>;

/// Malformed amounts come back in the JSON error envelope.
fn amount_query<T>(query: Result<Query<T>, QueryRejection>) -> Result<T, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| AppError::bad_request(rejection.body_text()))
}

pub fn router(service: Arc<BookService>) -> Router {
    Router::new()
        .route("/", get(list_books).post(insert_book))
        .route("/health", get(health_check))
        .route("/search", get(search_books))
        .route("/reports/borrowed", get(borrowed_count))
        .route("/reports/costs", get(cost_summary))
        .route("/reports/overdue-users", get(overdue_users))
        .route("/reports/responsible-users", get(responsible_users))
        .route(
            "/{id}",
            get(get_book).put(update_book).delete(delete_book),
        )
        .route("/{id}/borrowed", get(is_borrowed))
        .route("/{id}/purchase", get(purchase_check))
        .route("/{id}/discount", get(discount))
        .route("/{id}/bookable/{user_id}", get(bookable))
        .route("/{id}/lend/{user_id}", post(lend_book))
        .route("/{id}/return", post(return_book))
        .route("/{id}/reprice", post(reprice_book))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub name: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseParams {
    pub value: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct DiscountParams {
    pub percentage: Decimal,
}

#[derive(Debug, Serialize)]
pub struct Flag {
    pub value: bool,
}

#[derive(Debug, Serialize)]
pub struct Count {
    pub count: u64,
}

#[derive(Debug, Serialize)]
pub struct Amount {
    pub amount: Decimal,
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "books module is healthy"
}

async fn list_books(State(service): State<Arc<BookService>>) -> ApiResult<Vec<BookDto>> {
    Ok(Json(service.get_books().await?))
}

async fn insert_book(
    State(service): State<Arc<BookService>>,
    Json(payload): Json<BookDto>,
) -> Result<(StatusCode, Json<BookDto>), AppError> {
    let created = service.insert_book(payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn search_books(
    State(service): State<Arc<BookService>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Vec<BookDto>> {
    let found = service
        .search(params.name.as_deref(), params.author.as_deref())
        .await?;
    Ok(Json(found))
}

async fn get_book(State(service): State<Arc<BookService>>, Path(id): Path<Uuid>) -> ApiResult<BookDto> {
    Ok(Json(service.get_book_by_id(id).await?))
}

async fn update_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<BookDto>,
) -> ApiResult<BookDto> {
    Ok(Json(service.update_book(payload, id).await?))
}

async fn delete_book(
    State(service): State<Arc<BookService>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    service.delete_book(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn is_borrowed(State(service): State<Arc<BookService>>, Path(id): Path<Uuid>) -> ApiResult<Flag> {
    let value = service.verify_if_book_is_borrowed(id).await?;
    Ok(Json(Flag { value }))
}

async fn purchase_check(
    State(service): State<Arc<BookService>>,
    Path(id): Path<Uuid>,
    query: Result<Query<PurchaseParams>, QueryRejection>,
) -> ApiResult<Flag> {
    let params = amount_query(query)?;
    let value = service.verify_if_possible_to_buy(id, params.value).await?;
    Ok(Json(Flag { value }))
}

async fn discount(
    State(service): State<Arc<BookService>>,
    Path(id): Path<Uuid>,
    query: Result<Query<DiscountParams>, QueryRejection>,
) -> ApiResult<Amount> {
    let params = amount_query(query)?;
    let amount = service.discount(id, params.percentage).await?;
    Ok(Json(Amount { amount }))
}

async fn bookable(
    State(service): State<Arc<BookService>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Flag> {
    let value = service.check_booking_possibility(user_id, id).await?;
    Ok(Json(Flag { value }))
}

async fn lend_book(
    State(service): State<Arc<BookService>>,
    Path((id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Book> {
    Ok(Json(service.lend_book_to_user(user_id, id).await?))
}

async fn return_book(State(service): State<Arc<BookService>>, Path(id): Path<Uuid>) -> ApiResult<Book> {
    Ok(Json(service.return_book(id).await?))
}

async fn reprice_book(State(service): State<Arc<BookService>>, Path(id): Path<Uuid>) -> ApiResult<Book> {
    Ok(Json(service.update_price_according_year_edition(id).await?))
}

async fn borrowed_count(State(service): State<Arc<BookService>>) -> ApiResult<Count> {
    let count = service.borrowed_count().await?;
    Ok(Json(Count { count }))
}

async fn cost_summary(State(service): State<Arc<BookService>>) -> ApiResult<CostSummary> {
    Ok(Json(service.cost_summary().await?))
}

async fn overdue_users(State(service): State<Arc<BookService>>) -> ApiResult<Vec<User>> {
    Ok(Json(service.overdue_users().await?))
}

async fn responsible_users(State(service): State<Arc<BookService>>) -> ApiResult<Vec<User>> {
    Ok(Json(service.responsible_users().await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::books::repository::InMemoryBookRepository;
    use crate::modules::books::rules::LendingRules;
    use crate::modules::users::repository::InMemoryUserRepository;
    use crate::utils::FixedClock;
    use axum::body::Body;
    use axum::http::Request;
    use time::macros::date;
    use tower::ServiceExt;

    fn app(books: Vec<Book>, users: Vec<User>) -> Router {
        let service = BookService::new(
            Arc::new(InMemoryBookRepository::with_books(books)),
            Arc::new(InMemoryUserRepository::with_users(users)),
            LendingRules::default(),
            Arc::new(FixedClock(date!(2023 - 02 - 01))),
        );
        router(Arc::new(service))
    }

    async fn json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn insert_then_list() {
        let app = app(vec![], vec![]);

        let response = app
            .clone()
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(
                        r#"{"name":"Livro","author":"Rafael","cost":"10.0","year_edition":"2020-01-30"}"#,
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let response = app
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body[0]["name"], "Livro");
        assert_eq!(body[0]["year_edition"], "2020-01-30");
    }

    #[tokio::test]
    async fn invalid_payload_is_unprocessable() {
        let response = app(vec![], vec![])
            .oneshot(
                Request::post("/")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"name":"","author":""}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = json(response).await;
        assert_eq!(body["error"]["message"], "The parameters are wrong");
    }

    #[tokio::test]
    async fn unknown_book_is_404() {
        let response = app(vec![], vec![])
            .oneshot(
                Request::get(format!("/{}", Uuid::new_v4()))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn lending_a_borrowed_book_conflicts() {
        let mut book = Book::new("Livro", "Rafael");
        book.is_borrowed = Some(true);
        let user = User::new("Ana");
        let uri = format!("/{}/lend/{}", book.id, user.id);

        let response = app(vec![book], vec![user])
            .oneshot(Request::post(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = json(response).await;
        assert_eq!(body["error"]["message"], "Livro já foi emprestado");
    }

    #[tokio::test]
    async fn purchase_check_reads_value_from_query() {
        let mut book = Book::new("Livro", "Rafael");
        book.cost = Some(Decimal::new(9, 0));
        let uri = format!("/{}/purchase?value=10", book.id);

        let response = app(vec![book], vec![])
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["value"], true);
    }

    fn decimal(value: &serde_json::Value) -> Decimal {
        serde_json::from_value(value.clone()).unwrap()
    }

    fn priced(cost: Decimal) -> Book {
        Book {
            cost: Some(cost),
            ..Book::new("Livro", "Rafael")
        }
    }

    #[tokio::test]
    async fn discount_is_computed_from_cost() {
        let book = priced(Decimal::new(10, 0));
        let uri = format!("/{}/discount?percentage=10", book.id);

        let response = app(vec![book], vec![])
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(decimal(&json(response).await["amount"]), Decimal::ONE);
    }

    #[tokio::test]
    async fn malformed_discount_is_bad_request() {
        let book = priced(Decimal::new(10, 0));
        let uri = format!("/{}/discount?percentage=ten", book.id);

        let response = app(vec![book], vec![])
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["error"]["code"], "bad_request");
    }

    #[tokio::test]
    async fn oversized_discount_is_unprocessable() {
        let book = priced(Decimal::new(10, 0));
        let uri = format!("/{}/discount?percentage={}", book.id, Decimal::MAX);

        let response = app(vec![book], vec![])
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            json(response).await["error"]["message"],
            "Valor fora do intervalo suportado"
        );
    }

    #[tokio::test]
    async fn bookable_reflects_borrow_state() {
        let mut book = Book::new("Livro", "Rafael");
        book.is_borrowed = Some(false);
        let user = User::new("Ana");
        let uri = format!("/{}/bookable/{}", book.id, user.id);

        let response = app(vec![book], vec![user])
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["value"], true);
    }

    #[tokio::test]
    async fn lend_then_return() {
        let mut book = Book::new("Livro", "Rafael");
        book.is_borrowed = Some(false);
        let user = User::new("Ana");
        let book_id = book.id;
        let app = app(vec![book], vec![user.clone()]);

        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/{}/lend/{}", book_id, user.id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let lent = json(response).await;
        assert_eq!(lent["is_borrowed"], true);
        assert_eq!(lent["devolution_date"], "2023-02-15");

        let response = app
            .clone()
            .oneshot(
                Request::post(format!("/{book_id}/return"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json(response).await["is_borrowed"], false);

        let response = app
            .oneshot(
                Request::post(format!("/{book_id}/return"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn reprice_depreciates_by_edition_year() {
        let book = Book {
            year_edition: Some(date!(2020 - 01 - 30)),
            ..priced(Decimal::new(10, 0))
        };
        let uri = format!("/{}/reprice", book.id);

        let response = app(vec![book], vec![])
            .oneshot(Request::post(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(decimal(&json(response).await["cost"]), Decimal::new(97, 1));
    }

    #[tokio::test]
    async fn search_filters_by_author() {
        let books = vec![
            Book::new("Livro", "Rafael"),
            Book::new("Outro", "Ana"),
        ];

        let response = app(books, vec![])
            .oneshot(Request::get("/search?author=Ana").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(body[0]["name"], "Outro");
    }

    #[tokio::test]
    async fn cost_report_sums_and_maxes() {
        let books = vec![priced(Decimal::new(100, 1)), priced(Decimal::new(105, 1))];

        let response = app(books, vec![])
            .oneshot(Request::get("/reports/costs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(decimal(&body["total"]), Decimal::new(205, 1));
        assert_eq!(decimal(&body["max"]), Decimal::new(105, 1));
    }

    #[tokio::test]
    async fn empty_catalogue_report_is_unprocessable() {
        let response = app(vec![], vec![])
            .oneshot(Request::get("/reports/borrowed").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json(response).await["error"]["message"], "Nenhum livro foi encontrado");
    }
}
