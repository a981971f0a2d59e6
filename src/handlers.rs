//! Binding of panel controls to actions, and the client that runs them.
//!
//! Every control of the admin panel (a refresh button or a form) is
//! registered under its element id and the DOM event it fires. Running an
//! action builds a request, sends it once and renders whatever JSON comes
//! back into the action's surface. Handlers share nothing except the
//! surfaces they write to, so the last response to arrive wins.

use log::{info, warn};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::client::{ApiRequest, Transport};
use crate::error::{AdminError, Result};
use crate::form::FormData;
use crate::requests;
use crate::session::{self, Navigator};
use crate::view::{render, SurfaceId, View};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Click,
    Submit,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Click => f.pad("click"),
            EventKind::Submit => f.pad("submit"),
        }
    }
}

/// What the page should do with the native event afterwards
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Form submissions never reach the browser's own handling
    DefaultPrevented,
    Default,
}

impl Disposition {
    pub fn for_event(kind: EventKind) -> Self {
        match kind {
            EventKind::Submit => Disposition::DefaultPrevented,
            EventKind::Click => Disposition::Default,
        }
    }
}

/// A dispatched event: its disposition is settled before the action runs,
/// so it is reported whether or not the action succeeded.
#[derive(Debug)]
pub struct Dispatch {
    pub disposition: Disposition,
    pub result: Result<()>,
}

impl Dispatch {
    pub fn into_result(self) -> Result<Disposition> {
        let disposition = self.disposition;
        self.result.map(|()| disposition)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ListMenu,
    CreateMenuItem,
    UpdateMenuItem,
    DeleteMenuItem,
    ListTables,
    CreateTable,
    UpdateTable,
    DeleteTable,
    ListReservations,
    CreateReservation,
    UpdateReservation,
    DeleteReservation,
    ListOrders,
    CreateOrder,
    AddOrderItem,
    UpdateOrderItem,
    DeleteOrderItem,
    PayOrder,
    ListPayments,
    SalesReport,
    Health,
    Logout,
}

impl Action {
    /// Surface the response is rendered into
    pub fn surface(&self) -> SurfaceId {
        match self {
            Action::ListMenu
            | Action::CreateMenuItem
            | Action::UpdateMenuItem
            | Action::DeleteMenuItem => SurfaceId::Menu,
            Action::ListTables
            | Action::CreateTable
            | Action::UpdateTable
            | Action::DeleteTable => SurfaceId::Tables,
            Action::ListReservations
            | Action::CreateReservation
            | Action::UpdateReservation
            | Action::DeleteReservation => SurfaceId::Reservations,
            Action::ListOrders
            | Action::CreateOrder
            | Action::AddOrderItem
            | Action::UpdateOrderItem
            | Action::DeleteOrderItem => SurfaceId::Orders,
            Action::PayOrder | Action::ListPayments => SurfaceId::Billing,
            Action::SalesReport => SurfaceId::Reports,
            Action::Health | Action::Logout => SurfaceId::Session,
        }
    }

    /// Build the request for this action. `Logout` has its own flow and
    /// is not a plain request.
    pub fn request(&self, form: &FormData) -> Result<Option<ApiRequest>> {
        let request = match self {
            Action::ListMenu => requests::menu_list(),
            Action::CreateMenuItem => requests::menu_create(form)?,
            Action::UpdateMenuItem => requests::menu_update(form)?,
            Action::DeleteMenuItem => requests::menu_delete(form)?,
            Action::ListTables => requests::table_list(),
            Action::CreateTable => requests::table_create(form)?,
            Action::UpdateTable => requests::table_update(form)?,
            Action::DeleteTable => requests::table_delete(form)?,
            Action::ListReservations => requests::reservation_list(),
            Action::CreateReservation => requests::reservation_create(form)?,
            Action::UpdateReservation => requests::reservation_update(form)?,
            Action::DeleteReservation => requests::reservation_delete(form)?,
            Action::ListOrders => requests::order_list(),
            Action::CreateOrder => requests::order_create(form)?,
            Action::AddOrderItem => requests::order_item_add(form)?,
            Action::UpdateOrderItem => requests::order_item_update(form)?,
            Action::DeleteOrderItem => requests::order_item_delete(form)?,
            Action::PayOrder => requests::order_pay(form)?,
            Action::ListPayments => requests::payment_list(),
            Action::SalesReport => requests::sales_report(),
            Action::Health => requests::health(),
            Action::Logout => return Ok(None),
        };
        Ok(Some(request))
    }
}

/// (control id, event kind) → action
#[derive(Debug, Clone, Default)]
pub struct HandlerRegistry {
    bindings: HashMap<(String, EventKind), Action>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bindings matching the element ids of the admin dashboard
    pub fn with_default_bindings() -> Self {
        let mut registry = Self::new();
        let clicks = [
            ("refreshMenu", Action::ListMenu),
            ("refreshTables", Action::ListTables),
            ("refreshReservations", Action::ListReservations),
            ("refreshOrders", Action::ListOrders),
            ("refreshPayments", Action::ListPayments),
            ("refreshReports", Action::SalesReport),
            ("healthBtn", Action::Health),
            ("logoutBtn", Action::Logout),
        ];
        let submits = [
            ("addMenuForm", Action::CreateMenuItem),
            ("updateMenuForm", Action::UpdateMenuItem),
            ("deleteMenuForm", Action::DeleteMenuItem),
            ("addTableForm", Action::CreateTable),
            ("updateTableForm", Action::UpdateTable),
            ("deleteTableForm", Action::DeleteTable),
            ("addReservationForm", Action::CreateReservation),
            ("updateReservationForm", Action::UpdateReservation),
            ("deleteReservationForm", Action::DeleteReservation),
            ("addOrderForm", Action::CreateOrder),
            ("addOrderItemForm", Action::AddOrderItem),
            ("updateOrderItemForm", Action::UpdateOrderItem),
            ("deleteOrderItemForm", Action::DeleteOrderItem),
            ("payOrderForm", Action::PayOrder),
        ];
        for (control, action) in clicks {
            registry.register(control, EventKind::Click, action);
        }
        for (control, action) in submits {
            registry.register(control, EventKind::Submit, action);
        }
        registry
    }

    pub fn register(&mut self, control: impl Into<String>, kind: EventKind, action: Action) {
        self.bindings.insert((control.into(), kind), action);
    }

    pub fn lookup(&self, control: &str, kind: EventKind) -> Option<Action> {
        self.bindings.get(&(control.to_string(), kind)).copied()
    }

    /// All bindings sorted by control id
    pub fn bindings(&self) -> Vec<(&str, EventKind, Action)> {
        let mut all: Vec<_> = self
            .bindings
            .iter()
            .map(|((control, kind), action)| (control.as_str(), *kind, *action))
            .collect();
        all.sort_by(|a, b| a.0.cmp(b.0));
        all
    }
}

pub struct AdminClient {
    transport: Arc<dyn Transport>,
    view: View,
    registry: HandlerRegistry,
    navigator: Arc<dyn Navigator>,
}

impl AdminClient {
    pub fn new(transport: Arc<dyn Transport>, view: View, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            transport,
            view,
            registry: HandlerRegistry::with_default_bindings(),
            navigator,
        }
    }

    pub fn with_registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Dispatch a DOM-style event from a named control. Only an unbound
    /// control fails outright; the action's own failure is in `Dispatch::result`.
    pub async fn trigger(&self, control: &str, kind: EventKind, form: &FormData) -> Result<Dispatch> {
        let action = self
            .registry
            .lookup(control, kind)
            .ok_or_else(|| AdminError::UnknownControl(format!("{} ({})", control, kind)))?;

        let disposition = Disposition::for_event(kind);
        let result = self.run(action, form).await;
        Ok(Dispatch { disposition, result })
    }

    /// Send the action's request and render the response body into its surface
    pub async fn run(&self, action: Action, form: &FormData) -> Result<()> {
        let Some(request) = action.request(form)? else {
            session::logout(self.transport.as_ref(), self.navigator.as_ref()).await;
            return Ok(());
        };

        info!("Running {:?}: {} {}", action, request.method, request.path);
        let response = self.transport.send(request).await?;
        if !response.ok {
            warn!("{:?} failed on the server, rendering its response anyway", action);
        }

        let surface = self.view.surface(action.surface());
        render(surface.as_ref(), &response.data);
        Ok(())
    }

    pub async fn logout(&self) {
        session::logout(self.transport.as_ref(), self.navigator.as_ref()).await;
    }
}
