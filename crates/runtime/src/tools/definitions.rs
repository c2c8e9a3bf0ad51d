//! Shipped tool definitions.

use crate::tools::{ParamKind, ParamSpec, SchemaSpec, ToolDeclaration};
use serde_json::json;
use tracing::debug;

/// Flight lookup demo tool.
///
/// Returns details for the next available flight between two cities.
/// Only the Seattle → Miami route has data; any other pair yields an
/// error-shaped payload inside a successful result, which the model is
/// expected to relay to the user.
pub fn flight_info_tool() -> ToolDeclaration {
    let schema = SchemaSpec::new()
        .with(ParamSpec::new(
            "originCity",
            "The city of origin for the flight",
            ParamKind::String,
        ))
        .with(ParamSpec::new(
            "destinationCity",
            "The destination city for the flight",
            ParamKind::String,
        ));

    ToolDeclaration::from_fn(
        "getFlightInfo",
        "Returns information about the next available flight between two cities, \
         including airline, flight number, date, and time.",
        schema,
        |args| async move {
            let origin = args["originCity"].as_str().unwrap_or_default();
            let destination = args["destinationCity"].as_str().unwrap_or_default();
            debug!(%origin, %destination, "looking up flight");

            if origin.eq_ignore_ascii_case("seattle") && destination.eq_ignore_ascii_case("miami")
            {
                Ok(json!({
                    "airline": "Delta",
                    "flight_number": "DL123",
                    "flight_date": "May 8th, 2025",
                    "flight_time": "10:00AM",
                }))
            } else {
                Ok(json!({
                    "error": "No flights found between the specified cities for the given date.",
                }))
            }
        },
    )
}
