//! The marker-rendering collaborator.
//!
//! The tracker never draws anything itself. It only adds, removes and moves
//! markers through a [`MarkerDisplay`], which a map front-end implements.

use tracing::{debug, info};

use crate::snapshot::{BusRecord, LatLng};

/// Spaces placed before the route name so the label clears the bus icon.
pub const LABEL_PADDING: &str = "       ";

/// What a single marker shows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerVisual {
    /// Route name text, already padded.
    Label { text: String },
    /// Bus icon tinted with a `#RRGGBB` colour.
    Icon { tint: String },
}

impl MarkerVisual {
    pub fn label_for(bus: &BusRecord) -> Self {
        MarkerVisual::Label {
            text: format!("{LABEL_PADDING}{}", bus.route_description),
        }
    }

    pub fn icon_for(bus: &BusRecord) -> Self {
        MarkerVisual::Icon {
            tint: format!("#{}", bus.route_color),
        }
    }
}

pub trait MarkerDisplay {
    type Handle;

    fn add_marker(&mut self, position: LatLng, visual: MarkerVisual) -> Self::Handle;
    fn remove_marker(&mut self, handle: Self::Handle);
    fn move_marker(&mut self, handle: &Self::Handle, position: LatLng);
}

/// A display without a screen: hands out sequential ids and logs each call.
#[derive(Debug, Default)]
pub struct LoggingDisplay {
    next_id: u64,
    live: usize,
}

impl LoggingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Markers currently on the (virtual) map.
    pub fn live_markers(&self) -> usize {
        self.live
    }
}

impl MarkerDisplay for LoggingDisplay {
    type Handle = u64;

    fn add_marker(&mut self, position: LatLng, visual: MarkerVisual) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.live += 1;
        match &visual {
            MarkerVisual::Label { text } => {
                info!(
                    marker = id,
                    lat = position.latitude,
                    lon = position.longitude,
                    label = %text.trim_start(),
                    "Marker added"
                )
            }
            MarkerVisual::Icon { tint } => {
                debug!(
                    marker = id,
                    lat = position.latitude,
                    lon = position.longitude,
                    %tint,
                    "Marker added"
                )
            }
        }
        id
    }

    fn remove_marker(&mut self, handle: u64) {
        self.live = self.live.saturating_sub(1);
        debug!(marker = handle, "Marker removed");
    }

    fn move_marker(&mut self, handle: &u64, position: LatLng) {
        debug!(
            marker = *handle,
            lat = position.latitude,
            lon = position.longitude,
            "Marker moved"
        );
    }
}
