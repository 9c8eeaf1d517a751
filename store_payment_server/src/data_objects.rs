//! Query-string shapes for the listing endpoints.
//!
//! Multi-valued filters (`status`) are given as comma separated lists, e.g. `?status=pending,processing`.
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use spg_common::normalize_currency_code;
use store_payment_engine::{
    db_types::{OrderId, OrderStatusType, PaymentMethod, PaymentStatus, StoreId, UserId},
    order_objects::OrderQueryFilter,
    payment_objects::PaymentQueryFilter,
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderListQuery {
    pub owner_id: Option<UserId>,
    pub store_id: Option<StoreId>,
    pub currency: Option<String>,
    pub is_paid: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub status: Option<String>,
}

impl TryFrom<OrderListQuery> for OrderQueryFilter {
    type Error = ServerError;

    fn try_from(q: OrderListQuery) -> Result<Self, Self::Error> {
        let status = parse_list::<OrderStatusType>(q.status.as_deref())?;
        Ok(OrderQueryFilter {
            owner_id: q.owner_id,
            store_id: q.store_id,
            currency: q.currency.map(|c| normalize_currency_code(&c)).filter(|c| !c.is_empty()),
            is_paid: q.is_paid,
            since: q.since,
            until: q.until,
            status,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaymentListQuery {
    pub order_id: Option<OrderId>,
    pub status: Option<String>,
    pub method: Option<String>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentListQuery> for PaymentQueryFilter {
    type Error = ServerError;

    fn try_from(q: PaymentListQuery) -> Result<Self, Self::Error> {
        let status = parse_list::<PaymentStatus>(q.status.as_deref())?;
        let method = q
            .method
            .as_deref()
            .map(PaymentMethod::from_str)
            .transpose()
            .map_err(|e| ServerError::InvalidRequestBody(e.to_string()))?;
        Ok(PaymentQueryFilter {
            order_id: q.order_id,
            status,
            method,
            since: q.since,
            until: q.until,
            visible_to: None,
        })
    }
}

fn parse_list<T>(value: Option<&str>) -> Result<Option<Vec<T>>, ServerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(value) = value else {
        return Ok(None);
    };
    let items = value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| ServerError::InvalidRequestBody(e.to_string())))
        .collect::<Result<Vec<T>, _>>()?;
    Ok((!items.is_empty()).then_some(items))
}
