//! XML parser for the bus-position feed.
//!
//! The feed is a flat list of `<Bus>` elements whose fields are child elements
//! with text content:
//!
//! ```xml
//! <Buses>
//!   <Bus>
//!     <BusNumber>1101</BusNumber>
//!     <RouteDescription>Route 1</RouteDescription>
//!     <RouteColor>0000FF</RouteColor>
//!     <latitude>41.7355</latitude>
//!     <longitude>-111.8344</longitude>
//!   </Bus>
//! </Buses>
//! ```

use roxmltree::{Document, Node, ParsingOptions};
use tracing::debug;

use crate::error::ParseFailure;
use crate::snapshot::{BusRecord, BusSnapshot};

const BUS: &str = "Bus";
const BUS_NUMBER: &str = "BusNumber";
const LATITUDE: &str = "latitude";
const LONGITUDE: &str = "longitude";
const ROUTE_DESCRIPTION: &str = "RouteDescription";
const ROUTE_COLOR: &str = "RouteColor";

/// Bus number reported for a vehicle slot that is not in service.
const INACTIVE_BUS_NUMBER: &str = "0";
/// Latitude reported for a bus without a GPS fix.
const NO_FIX_LATITUDE: &str = "0.0";

/// Decodes a feed document into the snapshot of active buses.
///
/// A bus is skipped when its `BusNumber` is exactly `"0"` or its `latitude`
/// is exactly `"0.0"`. Every other bus is kept, in document order.
///
/// # Errors
///
/// Returns an error if the bytes are not UTF-8 or not well-formed XML, if a
/// `Bus` element lacks one of the fields needed to filter or build it, if
/// such a field is present but empty, or if an active bus has a coordinate
/// that is not a number. No partial snapshot is ever returned.
pub fn parse_feed(bytes: &[u8]) -> Result<BusSnapshot, ParseFailure> {
    let xml = std::str::from_utf8(bytes)?;
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(xml, options)?;

    let mut buses = Vec::new();
    let mut inactive = 0;

    for (index, bus) in doc
        .descendants()
        .filter(|n| n.has_tag_name(BUS))
        .enumerate()
    {
        let bus_number = field(bus, index, BUS_NUMBER)?;
        let latitude = field(bus, index, LATITUDE)?;

        if bus_number == INACTIVE_BUS_NUMBER || latitude == NO_FIX_LATITUDE {
            inactive += 1;
            continue;
        }

        let longitude = field(bus, index, LONGITUDE)?;

        buses.push(BusRecord {
            route_description: field(bus, index, ROUTE_DESCRIPTION)?.to_string(),
            latitude: coordinate(latitude, index, LATITUDE)?,
            longitude: coordinate(longitude, index, LONGITUDE)?,
            route_color: field(bus, index, ROUTE_COLOR)?.to_string(),
        });
    }

    debug!(active = buses.len(), inactive, "Feed parsed");
    Ok(BusSnapshot::new(buses, inactive))
}

/// Text of the first element named `name` below `bus`.
fn field<'a>(
    bus: Node<'a, '_>,
    index: usize,
    name: &'static str,
) -> Result<&'a str, ParseFailure> {
    let element = bus
        .descendants()
        .find(|n| n.has_tag_name(name))
        .ok_or(ParseFailure::MissingField { index, field: name })?;
    element
        .text()
        .ok_or(ParseFailure::EmptyField { index, field: name })
}

fn coordinate(value: &str, index: usize, name: &'static str) -> Result<f64, ParseFailure> {
    value
        .trim()
        .parse()
        .map_err(|_| ParseFailure::InvalidCoordinate {
            index,
            field: name,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bus_xml(number: &str, lat: &str, lon: &str, route: &str, color: &str) -> String {
        format!(
            "<Bus><BusNumber>{number}</BusNumber><RouteDescription>{route}</RouteDescription>\
             <RouteColor>{color}</RouteColor><latitude>{lat}</latitude>\
             <longitude>{lon}</longitude></Bus>"
        )
    }

    fn feed(buses: &[String]) -> Vec<u8> {
        format!("<?xml version=\"1.0\"?><Buses>{}</Buses>", buses.concat()).into_bytes()
    }

    #[test]
    fn test_parse_active_buses_in_document_order() {
        let bytes = feed(&[
            bus_xml("1101", "41.7355", "-111.8344", "Route 1", "0000FF"),
            bus_xml("1102", "41.7412", "-111.8101", "Route 2", "00FF00"),
        ]);

        let snapshot = parse_feed(&bytes).unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.inactive(), 0);
        let first = snapshot.get(0).unwrap();
        assert_eq!(first.route_description, "Route 1");
        assert_eq!(first.latitude, 41.7355);
        assert_eq!(first.longitude, -111.8344);
        assert_eq!(first.route_color, "0000FF");
        assert_eq!(snapshot.get(1).unwrap().route_description, "Route 2");
    }

    #[test]
    fn test_parse_skips_inactive_sentinels() {
        let bytes = feed(&[
            bus_xml("0", "41.7355", "-111.8344", "Parked", "000000"),
            bus_xml("1102", "0.0", "0.0", "No Fix", "000000"),
            bus_xml("1103", "41.7500", "-111.8200", "Route 3", "FF0000"),
        ]);

        let snapshot = parse_feed(&bytes).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.inactive(), 2);
        assert_eq!(snapshot.get(0).unwrap().route_description, "Route 3");
    }

    #[test]
    fn test_sentinels_are_exact_string_matches() {
        // "00" and "0" latitude are not the sentinel strings, so these buses stay.
        let bytes = feed(&[
            bus_xml("00", "41.7", "-111.8", "Route A", "111111"),
            bus_xml("1104", "0", "-111.8", "Route B", "222222"),
            bus_xml("1105", "0.00", "-111.8", "Route C", "333333"),
        ]);

        let snapshot = parse_feed(&bytes).unwrap();

        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot.get(1).unwrap().latitude, 0.0);
    }

    #[test]
    fn test_inactive_bus_may_have_garbage_fields() {
        // Only the filter fields are read for a skipped bus.
        let bytes = b"<Buses><Bus><BusNumber>0</BusNumber><latitude>x</latitude></Bus></Buses>";

        let snapshot = parse_feed(bytes).unwrap();

        assert!(snapshot.is_empty());
        assert_eq!(snapshot.inactive(), 1);
    }

    #[test]
    fn test_parse_no_buses() {
        let snapshot = parse_feed(b"<Buses/>").unwrap();
        assert!(snapshot.is_empty());
    }

    #[test]
    fn test_parse_malformed_xml() {
        let result = parse_feed(b"<Buses><Bus><BusNumber>1</Bus>");
        assert!(matches!(result, Err(ParseFailure::Xml(_))));
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let result = parse_feed(&[0xFF, 0xFE, 0x00, 0x01]);
        assert!(matches!(result, Err(ParseFailure::Encoding(_))));
    }

    #[test]
    fn test_missing_field_on_active_bus_fails() {
        let bytes = b"<Buses>\
            <Bus><BusNumber>1</BusNumber><latitude>41.7</latitude><longitude>-111.8</longitude>\
            <RouteDescription>Route 1</RouteDescription><RouteColor>FF0000</RouteColor></Bus>\
            <Bus><BusNumber>2</BusNumber><latitude>41.7</latitude><longitude>-111.8</longitude>\
            <RouteDescription>Route 2</RouteDescription></Bus>\
            </Buses>";

        match parse_feed(bytes) {
            Err(ParseFailure::MissingField { index, field }) => {
                assert_eq!(index, 1);
                assert_eq!(field, ROUTE_COLOR);
            }
            other => panic!("expected missing field, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_filter_field_fails() {
        let bytes = b"<Buses><Bus><latitude>41.7</latitude></Bus></Buses>";
        assert!(matches!(
            parse_feed(bytes),
            Err(ParseFailure::MissingField {
                field: BUS_NUMBER,
                ..
            })
        ));
    }

    #[test]
    fn test_non_numeric_coordinate_fails() {
        let bytes = feed(&[bus_xml("1101", "north", "-111.8", "Route 1", "0000FF")]);
        assert!(matches!(
            parse_feed(&bytes),
            Err(ParseFailure::InvalidCoordinate {
                field: LATITUDE,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_route_description_fails() {
        let bytes = feed(&[bus_xml("1101", "41.7", "-111.8", "", "0000FF")]);
        assert!(matches!(
            parse_feed(&bytes),
            Err(ParseFailure::EmptyField {
                index: 0,
                field: ROUTE_DESCRIPTION,
            })
        ));
    }

    #[test]
    fn test_self_closing_fields_fail() {
        let bytes = b"<Buses><Bus><BusNumber/><RouteDescription/><RouteColor/>\
            <latitude>41.7</latitude><longitude>-111.8</longitude></Bus></Buses>";
        assert!(matches!(
            parse_feed(bytes),
            Err(ParseFailure::EmptyField {
                field: BUS_NUMBER,
                ..
            })
        ));
    }

    #[test]
    fn test_empty_color_on_active_bus_fails() {
        let bytes = feed(&[bus_xml("1101", "41.7", "-111.8", "Route 1", "")]);
        assert!(matches!(
            parse_feed(&bytes),
            Err(ParseFailure::EmptyField {
                field: ROUTE_COLOR,
                ..
            })
        ));
    }

    #[test]
    fn test_feed_with_doctype_parses() {
        let bytes = format!(
            "<?xml version=\"1.0\"?><!DOCTYPE Buses><Buses>{}</Buses>",
            bus_xml("1101", "41.7355", "-111.8344", "Route 1", "0000FF")
        );

        let snapshot = parse_feed(bytes.as_bytes()).unwrap();

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get(0).unwrap().route_color, "0000FF");
    }
}
