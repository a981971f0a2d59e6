//! Request builders, one per resource operation.
//!
//! Each builder takes the submitted form and returns the [`ApiRequest`] to
//! send. Blank fields never reach a payload unless the operation always sends
//! them (`price` on menu create, `size` on reservation create, `capacity` on
//! table create).

use serde_json::{Map, Value};

use crate::client::ApiRequest;
use crate::error::Result;
use crate::form::{
    number_value, parse_bool, parse_float, parse_int, parse_items, required_id, to_utc_iso,
    FormData,
};

type Payload = Map<String, Value>;

/// Every non-blank field as a string, in form order
fn passthrough(form: &FormData) -> Payload {
    form.iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| (name.to_string(), Value::String(value.to_string())))
        .collect()
}

fn put_text(payload: &mut Payload, form: &FormData, name: &str) {
    if let Some(value) = form.value(name) {
        payload.insert(name.to_string(), Value::String(value.to_string()));
    }
}

fn put_int(payload: &mut Payload, form: &FormData, name: &str) {
    if let Some(value) = form.value(name) {
        payload.insert(name.to_string(), number_value(parse_int(value)));
    }
}

fn put_float(payload: &mut Payload, form: &FormData, name: &str) {
    if let Some(value) = form.value(name) {
        payload.insert(name.to_string(), number_value(parse_float(value)));
    }
}

fn put_bool(payload: &mut Payload, form: &FormData, name: &str) {
    if let Some(value) = form.value(name) {
        payload.insert(name.to_string(), Value::Bool(parse_bool(value)));
    }
}

fn put_time(payload: &mut Payload, form: &FormData, name: &str) -> Result<()> {
    if let Some(value) = form.value(name) {
        payload.insert(name.to_string(), Value::String(to_utc_iso(value)?));
    }
    Ok(())
}

// ---------- MENU ----------

pub fn menu_list() -> ApiRequest {
    ApiRequest::get("/api/menu")
}

pub fn menu_create(form: &FormData) -> Result<ApiRequest> {
    let mut payload = passthrough(form);
    let price = parse_float(form.get("price").unwrap_or_default());
    payload.insert("price".to_string(), number_value(price));
    Ok(ApiRequest::post("/api/menu", Value::Object(payload)))
}

pub fn menu_update(form: &FormData) -> Result<ApiRequest> {
    let id = required_id(form, "id")?;
    let mut payload = Payload::new();
    put_text(&mut payload, form, "name");
    put_text(&mut payload, form, "category");
    put_bool(&mut payload, form, "available");
    put_float(&mut payload, form, "price");
    Ok(ApiRequest::put(format!("/api/menu/{}", id), Value::Object(payload)))
}

pub fn menu_delete(form: &FormData) -> Result<ApiRequest> {
    let id = required_id(form, "id")?;
    Ok(ApiRequest::delete(format!("/api/menu/{}", id)))
}

// ---------- TABLES ----------

pub fn table_list() -> ApiRequest {
    ApiRequest::get("/api/tables")
}

pub fn table_create(form: &FormData) -> Result<ApiRequest> {
    let mut payload = passthrough(form);
    let capacity = parse_int(form.value("capacity").unwrap_or("2"));
    payload.insert("capacity".to_string(), number_value(capacity));
    Ok(ApiRequest::post("/api/tables", Value::Object(payload)))
}

pub fn table_update(form: &FormData) -> Result<ApiRequest> {
    let id = required_id(form, "id")?;
    let mut payload = Payload::new();
    put_text(&mut payload, form, "label");
    put_int(&mut payload, form, "capacity");
    put_bool(&mut payload, form, "occupied");
    Ok(ApiRequest::put(format!("/api/tables/{}", id), Value::Object(payload)))
}

pub fn table_delete(form: &FormData) -> Result<ApiRequest> {
    let id = required_id(form, "id")?;
    Ok(ApiRequest::delete(format!("/api/tables/{}", id)))
}

// ---------- RESERVATIONS ----------

pub fn reservation_list() -> ApiRequest {
    ApiRequest::get("/api/reservations")
}

pub fn reservation_create(form: &FormData) -> Result<ApiRequest> {
    let mut payload = passthrough(form);
    put_time(&mut payload, form, "time")?;
    let size = parse_int(form.get("size").unwrap_or_default());
    payload.insert("size".to_string(), number_value(size));
    put_int(&mut payload, form, "table_id");
    Ok(ApiRequest::post("/api/reservations", Value::Object(payload)))
}

pub fn reservation_update(form: &FormData) -> Result<ApiRequest> {
    let id = required_id(form, "id")?;
    let mut payload = Payload::new();
    put_text(&mut payload, form, "name");
    put_text(&mut payload, form, "phone");
    put_int(&mut payload, form, "size");
    put_time(&mut payload, form, "time")?;
    put_int(&mut payload, form, "table_id");
    Ok(ApiRequest::put(
        format!("/api/reservations/{}", id),
        Value::Object(payload),
    ))
}

pub fn reservation_delete(form: &FormData) -> Result<ApiRequest> {
    let id = required_id(form, "id")?;
    Ok(ApiRequest::delete(format!("/api/reservations/{}", id)))
}

// ---------- ORDERS ----------

pub fn order_list() -> ApiRequest {
    ApiRequest::get("/api/orders")
}

pub fn order_create(form: &FormData) -> Result<ApiRequest> {
    let mut payload = Payload::new();
    put_int(&mut payload, form, "table_id");
    payload.insert("items".to_string(), parse_items(form.get("items")));
    Ok(ApiRequest::post("/api/orders", Value::Object(payload)))
}

/// Either a menu item reference or a custom line with its own name and price
pub fn order_item_add(form: &FormData) -> Result<ApiRequest> {
    let order_id = required_id(form, "order_id")?;
    let mut payload = Payload::new();
    put_int(&mut payload, form, "menu_item_id");
    put_text(&mut payload, form, "name");
    put_float(&mut payload, form, "price");
    put_int(&mut payload, form, "quantity");
    Ok(ApiRequest::post(
        format!("/api/orders/{}/items", order_id),
        Value::Object(payload),
    ))
}

pub fn order_item_update(form: &FormData) -> Result<ApiRequest> {
    let order_id = required_id(form, "order_id")?;
    let item_id = required_id(form, "item_id")?;
    let mut payload = Payload::new();
    put_int(&mut payload, form, "quantity");
    put_float(&mut payload, form, "price");
    Ok(ApiRequest::put(
        format!("/api/orders/{}/items/{}", order_id, item_id),
        Value::Object(payload),
    ))
}

pub fn order_item_delete(form: &FormData) -> Result<ApiRequest> {
    let order_id = required_id(form, "order_id")?;
    let item_id = required_id(form, "item_id")?;
    Ok(ApiRequest::delete(format!(
        "/api/orders/{}/items/{}",
        order_id, item_id
    )))
}

// ---------- BILLING ----------

pub fn order_pay(form: &FormData) -> Result<ApiRequest> {
    let order_id = required_id(form, "order_id")?;
    let mut payload = Payload::new();
    put_float(&mut payload, form, "amount");
    put_text(&mut payload, form, "method");
    Ok(ApiRequest::post(
        format!("/api/orders/{}/pay", order_id),
        Value::Object(payload),
    ))
}

pub fn payment_list() -> ApiRequest {
    ApiRequest::get("/api/payments")
}

// ---------- REPORTS / HEALTH ----------

pub fn sales_report() -> ApiRequest {
    ApiRequest::get("/api/reports/sales")
}

pub fn health() -> ApiRequest {
    ApiRequest::get("/api/health")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::Method;
    use crate::error::AdminError;
    use serde_json::json;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        pairs.iter().copied().collect()
    }

    #[test]
    fn menu_create_coerces_price() {
        let req = menu_create(&form(&[
            ("name", "Soup"),
            ("category", "Starters"),
            ("price", "4.5"),
        ]))
        .unwrap();
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/api/menu");
        assert_eq!(
            req.body,
            Some(json!({"name": "Soup", "category": "Starters", "price": 4.5}))
        );
    }

    #[test]
    fn menu_create_bad_price_is_null() {
        let req = menu_create(&form(&[("name", "Soup"), ("category", ""), ("price", "cheap")])).unwrap();
        assert_eq!(req.body, Some(json!({"name": "Soup", "price": null})));
    }

    #[test]
    fn menu_update_only_sends_filled_fields() {
        let req = menu_update(&form(&[
            ("id", "5"),
            ("name", ""),
            ("category", ""),
            ("available", "FALSE"),
            ("price", "12"),
        ]))
        .unwrap();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.path, "/api/menu/5");
        assert_eq!(req.body, Some(json!({"available": false, "price": 12})));

        let req = menu_update(&form(&[("id", "5"), ("available", "True")])).unwrap();
        assert_eq!(req.body, Some(json!({"available": true})));
    }

    #[test]
    fn update_and_delete_need_an_id() {
        assert!(matches!(menu_update(&form(&[("name", "x")])), Err(AdminError::Coercion(_))));
        assert!(matches!(table_delete(&form(&[("id", "")])), Err(AdminError::Coercion(_))));
        assert!(matches!(order_pay(&form(&[("amount", "3")])), Err(AdminError::Coercion(_))));
    }

    #[test]
    fn table_create_defaults_capacity() {
        let req = table_create(&form(&[("label", "T1"), ("capacity", "")])).unwrap();
        assert_eq!(req.body, Some(json!({"label": "T1", "capacity": 2})));

        let req = table_create(&form(&[("label", "T2"), ("capacity", "6")])).unwrap();
        assert_eq!(req.body, Some(json!({"label": "T2", "capacity": 6})));
    }

    #[test]
    fn table_update_and_delete() {
        let req = table_update(&form(&[
            ("id", "3"),
            ("label", ""),
            ("capacity", "4"),
            ("occupied", "yes"),
        ]))
        .unwrap();
        assert_eq!(req.path, "/api/tables/3");
        assert_eq!(req.body, Some(json!({"capacity": 4, "occupied": false})));

        let req = table_delete(&form(&[("id", "3")])).unwrap();
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.path, "/api/tables/3");
        assert_eq!(req.body, None);
    }

    #[test]
    fn reservation_create_coerces_fields() {
        let req = reservation_create(&form(&[
            ("name", "Ada"),
            ("phone", "+1555"),
            ("size", "4"),
            ("time", "2025-10-05T19:30:00Z"),
            ("table_id", ""),
        ]))
        .unwrap();
        assert_eq!(req.path, "/api/reservations");
        assert_eq!(
            req.body,
            Some(json!({
                "name": "Ada",
                "phone": "+1555",
                "size": 4,
                "time": "2025-10-05T19:30:00.000Z"
            }))
        );
    }

    #[test]
    fn reservation_create_table_and_missing_size() {
        let req = reservation_create(&form(&[("name", "Ada"), ("table_id", "9")])).unwrap();
        assert_eq!(
            req.body,
            Some(json!({"name": "Ada", "size": null, "table_id": 9}))
        );
    }

    #[test]
    fn reservation_create_rejects_bad_time() {
        let result = reservation_create(&form(&[("size", "2"), ("time", "soon")]));
        assert!(matches!(result, Err(AdminError::Coercion(_))));
    }

    #[test]
    fn reservation_update_with_only_size() {
        let req = reservation_update(&form(&[("id", "7"), ("size", "4")])).unwrap();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.path, "/api/reservations/7");
        assert_eq!(req.body, Some(json!({"size": 4})));
    }

    #[test]
    fn reservation_delete_path() {
        let req = reservation_delete(&form(&[("id", "12")])).unwrap();
        assert_eq!(req.path, "/api/reservations/12");
        assert_eq!(req.body, None);
    }

    #[test]
    fn order_create_drops_other_fields() {
        let req = order_create(&form(&[
            ("table_id", "2"),
            ("note", "window seat"),
            ("items", r#"[{"menu_item_id":1,"quantity":2}]"#),
        ]))
        .unwrap();
        assert_eq!(
            req.body,
            Some(json!({"table_id": 2, "items": [{"menu_item_id": 1, "quantity": 2}]}))
        );
    }

    #[test]
    fn order_create_malformed_items() {
        let req = order_create(&form(&[("table_id", ""), ("items", "[{oops")])).unwrap();
        assert_eq!(req.body, Some(json!({"items": []})));
    }

    #[test]
    fn pay_builds_path_from_order_id() {
        let req = order_pay(&form(&[("order_id", "11"), ("amount", "25.50"), ("method", "card")])).unwrap();
        assert_eq!(req.path, "/api/orders/11/pay");
        assert_eq!(req.body, Some(json!({"amount": 25.5, "method": "card"})));

        let req = order_pay(&form(&[("order_id", "11"), ("amount", ""), ("method", "")])).unwrap();
        assert_eq!(req.body, Some(json!({})));
    }

    #[test]
    fn order_item_requests() {
        let req = order_item_add(&form(&[("order_id", "4"), ("menu_item_id", "2"), ("quantity", "3")])).unwrap();
        assert_eq!(req.path, "/api/orders/4/items");
        assert_eq!(req.body, Some(json!({"menu_item_id": 2, "quantity": 3})));

        let req = order_item_add(&form(&[("order_id", "4"), ("name", "Corkage"), ("price", "10")])).unwrap();
        assert_eq!(req.body, Some(json!({"name": "Corkage", "price": 10})));

        let req = order_item_update(&form(&[("order_id", "4"), ("item_id", "8"), ("quantity", "1")])).unwrap();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.path, "/api/orders/4/items/8");
        assert_eq!(req.body, Some(json!({"quantity": 1})));

        let req = order_item_delete(&form(&[("order_id", "4"), ("item_id", "8")])).unwrap();
        assert_eq!(req.method, Method::Delete);
        assert_eq!(req.path, "/api/orders/4/items/8");
    }

    #[test]
    fn list_endpoints() {
        assert_eq!(menu_list().path, "/api/menu");
        assert_eq!(table_list().path, "/api/tables");
        assert_eq!(reservation_list().path, "/api/reservations");
        assert_eq!(order_list().path, "/api/orders");
        assert_eq!(payment_list().path, "/api/payments");
        assert_eq!(sales_report().path, "/api/reports/sales");
        assert_eq!(health().method, Method::Get);
    }
}
