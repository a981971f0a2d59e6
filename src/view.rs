use log::error;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::sync::{Arc, Mutex};

/// Text region that receives a resource's JSON output
pub trait Surface: Send + Sync {
    fn set_text(&self, text: &str);
    fn append_text(&self, text: &str);
    fn text(&self) -> String;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceId {
    Menu,
    Tables,
    Reservations,
    Orders,
    Billing,
    Reports,
    Events,
    Session,
}

impl SurfaceId {
    pub const ALL: [SurfaceId; 8] = [
        SurfaceId::Menu,
        SurfaceId::Tables,
        SurfaceId::Reservations,
        SurfaceId::Orders,
        SurfaceId::Billing,
        SurfaceId::Reports,
        SurfaceId::Events,
        SurfaceId::Session,
    ];

    /// Element id of the output area in the admin panel
    pub fn element_id(&self) -> &'static str {
        match self {
            SurfaceId::Menu => "menuOut",
            SurfaceId::Tables => "tablesOut",
            SurfaceId::Reservations => "reservationsOut",
            SurfaceId::Orders => "ordersOut",
            SurfaceId::Billing => "billingOut",
            SurfaceId::Reports => "reportsOut",
            SurfaceId::Events => "eventsOut",
            SurfaceId::Session => "sessionOut",
        }
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.element_id())
    }
}

/// In-memory surface; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySurface {
    buffer: Arc<Mutex<String>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Surface for MemorySurface {
    fn set_text(&self, text: &str) {
        match self.buffer.lock() {
            Ok(mut buffer) => {
                buffer.clear();
                buffer.push_str(text);
            }
            Err(e) => error!("Surface buffer poisoned: {}", e),
        }
    }

    fn append_text(&self, text: &str) {
        match self.buffer.lock() {
            Ok(mut buffer) => buffer.push_str(text),
            Err(e) => error!("Surface buffer poisoned: {}", e),
        }
    }

    fn text(&self) -> String {
        self.buffer
            .lock()
            .map(|buffer| buffer.clone())
            .unwrap_or_default()
    }
}

/// Surface for terminals: every write goes straight to stdout
#[derive(Debug, Clone)]
pub struct StdoutSurface {
    inner: MemorySurface,
}

impl StdoutSurface {
    pub fn new() -> Self {
        Self {
            inner: MemorySurface::new(),
        }
    }

    fn emit(text: &str) {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        if let Err(e) = lock.write_all(text.as_bytes()).and_then(|_| lock.flush()) {
            error!("Failed to write to stdout: {}", e);
        }
    }
}

impl Default for StdoutSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl Surface for StdoutSurface {
    fn set_text(&self, text: &str) {
        self.inner.set_text(text);
        Self::emit(text);
        if !text.ends_with('\n') {
            Self::emit("\n");
        }
    }

    fn append_text(&self, text: &str) {
        self.inner.append_text(text);
        Self::emit(text);
    }

    fn text(&self) -> String {
        self.inner.text()
    }
}

/// The set of named surfaces, built once at startup
#[derive(Clone)]
pub struct View {
    surfaces: HashMap<SurfaceId, Arc<dyn Surface>>,
}

impl View {
    pub fn new<F>(mut factory: F) -> Self
    where
        F: FnMut(SurfaceId) -> Arc<dyn Surface>,
    {
        let surfaces = SurfaceId::ALL
            .iter()
            .map(|id| (*id, factory(*id)))
            .collect();
        Self { surfaces }
    }

    pub fn in_memory() -> Self {
        Self::new(|_| Arc::new(MemorySurface::new()) as Arc<dyn Surface>)
    }

    pub fn stdout() -> Self {
        Self::new(|_| Arc::new(StdoutSurface::new()) as Arc<dyn Surface>)
    }

    pub fn surface(&self, id: SurfaceId) -> Arc<dyn Surface> {
        match self.surfaces.get(&id) {
            Some(surface) => Arc::clone(surface),
            // Every id is populated in `new`
            None => Arc::new(MemorySurface::new()),
        }
    }

    pub fn text(&self, id: SurfaceId) -> String {
        self.surface(id).text()
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("surfaces", &self.surfaces.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Replace the surface text with the pretty-printed (2-space) JSON of `data`
pub fn render(surface: &dyn Surface, data: &Value) {
    match serde_json::to_string_pretty(data) {
        Ok(text) => surface.set_text(&text),
        Err(e) => error!("Failed to serialize response for rendering: {}", e),
    }
}

/// Append one compact JSON line for a live event
pub fn append_event(surface: &dyn Surface, payload: &Value) {
    surface.append_text(&format!("{}\n", payload));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_replaces_with_pretty_json() {
        let surface = MemorySurface::new();
        surface.set_text("stale");
        render(&surface, &json!({"id": 1, "name": "Soup"}));
        assert_eq!(surface.text(), "{\n  \"id\": 1,\n  \"name\": \"Soup\"\n}");

        render(&surface, &json!([]));
        assert_eq!(surface.text(), "[]");
    }

    #[test]
    fn append_event_is_one_compact_line() {
        let surface = MemorySurface::new();
        append_event(&surface, &json!({"table_id": 2, "status": "seated"}));
        append_event(&surface, &json!({"type": "menu.deleted", "id": 4}));
        assert_eq!(
            surface.text(),
            "{\"table_id\":2,\"status\":\"seated\"}\n{\"type\":\"menu.deleted\",\"id\":4}\n"
        );
    }

    #[test]
    fn clones_share_buffer() {
        let surface = MemorySurface::new();
        let other = surface.clone();
        other.append_text("hello");
        assert_eq!(surface.text(), "hello");
    }

    #[test]
    fn view_has_every_surface() {
        let view = View::in_memory();
        for id in SurfaceId::ALL {
            view.surface(id).set_text(id.element_id());
        }
        assert_eq!(view.text(SurfaceId::Events), "eventsOut");
        assert_eq!(view.text(SurfaceId::Menu), "menuOut");
    }
}
