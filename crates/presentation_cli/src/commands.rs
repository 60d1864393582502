//! Command execution and rendering

use std::fmt::{Display, Write as _};

use integration_bus::{
    ApiError, BusApi, ErrorSignal, Line, LineDefinition, MapConfig, MapLoadError, MapSdkLoader,
    OperationResult, Payload, RoutePlan, SignalSource, Station,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::cli::Commands;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// One summary line per item
    Text,
    /// Pretty-printed payload
    Json,
}

impl OutputFormat {
    /// Raw bodies are not decoded into models, so they are always shown as JSON
    #[must_use]
    pub const fn from_flags(json: bool, raw: bool) -> Self {
        if json || raw { Self::Json } else { Self::Text }
    }
}

/// Errors surfaced by a command
#[derive(Debug, Error)]
pub enum CommandError {
    /// Backend call or payload decoding failed
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Map SDK could not be loaded
    #[error(transparent)]
    Map(#[from] MapLoadError),
}

impl CommandError {
    /// Whether the client's reporter has already shown this error to the user
    #[must_use]
    pub const fn already_reported(&self) -> bool {
        match self {
            Self::Api(err) => err.is_transport() || err.is_application(),
            Self::Map(_) => false,
        }
    }

    /// User-facing signal for this error
    #[must_use]
    pub fn signal(&self) -> ErrorSignal {
        match self {
            Self::Api(err) => err.signal(),
            Self::Map(err) => ErrorSignal {
                message: err.to_string(),
                source: SignalSource::Client(format!("{err:?}")),
            },
        }
    }
}

/// Execute a command and return the text to print
///
/// # Errors
///
/// Returns an error if the backend call fails or its payload cannot be
/// rendered.
pub async fn run(
    api: &dyn BusApi,
    map: &MapConfig,
    command: Commands,
    format: OutputFormat,
) -> Result<String, CommandError> {
    debug!(?command, ?format, "Running command");

    let output = match command {
        Commands::Stations { query } => {
            let payload = match query.as_deref() {
                Some(query) => api.search_stations(query).await?,
                None => api.list_stations().await?,
            };
            render_list::<Station>(payload, format, "No stations found")?
        },
        Commands::AdminStations { keyword } => {
            let payload = api.admin_search_stations(keyword.as_deref()).await?;
            render_list::<Station>(payload, format, "No stations found")?
        },
        Commands::AddStation { id, name } => {
            render_operation(api.add_station(id, &name).await?, format)
        },
        Commands::UpdateStation { id, name } => {
            render_operation(api.update_station(id, &name).await?, format)
        },
        Commands::DeleteStation { id } => render_operation(api.delete_station(id).await?, format),
        Commands::Routes => {
            render_list::<Line>(api.list_routes().await?, format, "No lines found")?
        },
        Commands::AddLine(args) => {
            let line = LineDefinition::from(args);
            render_operation(api.add_line(&line).await?, format)
        },
        Commands::UpdateLine(args) => {
            let line = LineDefinition::from(args);
            render_operation(api.update_line(&line).await?, format)
        },
        Commands::DeleteLine { id } => render_operation(api.delete_line(id).await?, format),
        Commands::Plan {
            start,
            end,
            max_transfers,
        } => {
            let payload = api.plan_route(&start, &end, max_transfers).await?;
            render_plans(payload, format)?
        },
        Commands::StationLines { identifier } => render_list::<Line>(
            api.station_lines(&identifier).await?,
            format,
            "No lines serve this station",
        )?,
        Commands::LineStations { identifier } => render_list::<Station>(
            api.line_stations(&identifier).await?,
            format,
            "No stations found for this line",
        )?,
        Commands::MapSdk { ak } => {
            let mut map = map.clone();
            if ak.is_some() {
                map.api_key = ak;
            }
            let loader = MapSdkLoader::new(&map)?;
            let sdk = loader.load().await?;
            format!("🗺️  Map SDK loaded ({} bytes)", sdk.script.len())
        },
    };

    Ok(output)
}

fn render_json(payload: &Payload) -> String {
    serde_json::to_string_pretty(payload.as_value()).unwrap_or_else(|_| payload.to_string())
}

fn render_list<T>(payload: Payload, format: OutputFormat, empty: &str) -> Result<String, ApiError>
where
    T: DeserializeOwned + Display,
{
    if format == OutputFormat::Json {
        return Ok(render_json(&payload));
    }

    let items: Vec<T> = if payload.is_empty() {
        Vec::new()
    } else {
        payload.decode()?
    };

    if items.is_empty() {
        return Ok(empty.to_string());
    }

    Ok(items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n"))
}

fn render_plans(payload: Payload, format: OutputFormat) -> Result<String, ApiError> {
    if format == OutputFormat::Json {
        return Ok(render_json(&payload));
    }

    let plans: Vec<RoutePlan> = if payload.is_empty() {
        Vec::new()
    } else {
        payload.decode()?
    };

    if plans.is_empty() {
        return Ok("No routes found".to_string());
    }

    let mut out = String::new();
    for (i, plan) in plans.iter().enumerate() {
        let _ = writeln!(out, "🚌 {}. {}", i + 1, plan.format_summary());
        for segment in &plan.segments {
            let _ = writeln!(
                out,
                "   {} {} → {} ({} stops)",
                segment.line_name,
                segment.from_sid,
                segment.to_sid,
                segment.stops_count.unwrap_or(0)
            );
        }
    }
    Ok(out.trim_end().to_string())
}

fn render_operation(payload: Payload, format: OutputFormat) -> String {
    if format == OutputFormat::Json {
        return render_json(&payload);
    }

    if payload.is_empty() {
        return "✅ Done".to_string();
    }

    match payload.clone().decode::<OperationResult>() {
        Ok(result) if result.success => format!("✅ {}", result.message),
        Ok(result) => format!("⚠️  {}", result.message),
        Err(_) => payload.to_string(),
    }
}
