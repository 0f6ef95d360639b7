use std::sync::Arc;

use axum::{
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use orderdesk_core::OrderId;
use orderdesk_infra::{OrdersService, UnitOfWork, UnitOfWorkFactory};

use crate::app::dto;
use crate::app::errors::ApiError;

type HandlerResult = Result<Response, ApiError>;

fn parse_id(raw: &str) -> Result<OrderId, ApiError> {
    raw.parse().map_err(|_| ApiError::InvalidId(raw.to_string()))
}

fn order_json(status: StatusCode, order: &orderdesk_orders::Order) -> Response {
    (status, Json(dto::OrderResponse::from(order))).into_response()
}

pub async fn list_orders<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    query: Result<Query<dto::ListOrdersQuery>, QueryRejection>,
) -> HandlerResult {
    let Query(query) = query?;

    let mut uow = factory.begin().await?;
    let orders = OrdersService::new(uow.orders())
        .list_orders(query.cancelled, query.limit)
        .await?;

    Ok(Json(dto::ListOrdersResponse::from_orders(&orders)).into_response())
}

pub async fn create_order<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> HandlerResult {
    let Json(body) = body?;

    let mut uow = factory.begin().await?;
    let order = OrdersService::new(uow.orders())
        .place_order(body.into_drafts())
        .await?;
    uow.commit().await?;

    Ok(order_json(StatusCode::CREATED, &order))
}

pub async fn get_order<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    Path(order_id): Path<String>,
) -> HandlerResult {
    let order_id = parse_id(&order_id)?;

    let mut uow = factory.begin().await?;
    let order = OrdersService::new(uow.orders()).get_order(order_id).await?;

    Ok(order_json(StatusCode::OK, &order))
}

pub async fn update_order<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    Path(order_id): Path<String>,
    body: Result<Json<dto::CreateOrderRequest>, JsonRejection>,
) -> HandlerResult {
    let order_id = parse_id(&order_id)?;
    let Json(body) = body?;

    let mut uow = factory.begin().await?;
    let order = OrdersService::new(uow.orders())
        .update_order(order_id, body.into_drafts())
        .await?;
    uow.commit().await?;

    Ok(order_json(StatusCode::OK, &order))
}

pub async fn delete_order<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    Path(order_id): Path<String>,
) -> HandlerResult {
    let order_id = parse_id(&order_id)?;

    let mut uow = factory.begin().await?;
    OrdersService::new(uow.orders()).delete_order(order_id).await?;
    uow.commit().await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn cancel_order<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    Path(order_id): Path<String>,
) -> HandlerResult {
    let order_id = parse_id(&order_id)?;

    let mut uow = factory.begin().await?;
    let order = OrdersService::new(uow.orders()).cancel_order(order_id).await?;
    uow.commit().await?;

    Ok(order_json(StatusCode::OK, &order))
}

pub async fn pay_order<F: UnitOfWorkFactory>(
    State(factory): State<Arc<F>>,
    Path(order_id): Path<String>,
) -> HandlerResult {
    let order_id = parse_id(&order_id)?;

    let mut uow = factory.begin().await?;
    let order = OrdersService::new(uow.orders()).pay_order(order_id).await?;
    uow.commit().await?;

    Ok(order_json(StatusCode::OK, &order))
}
