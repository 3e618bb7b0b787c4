mod svg;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use partcfg_client::wire::OrderRequest;
use partcfg_client::{CadClient, CadOutcome, ClientConfig};
use partcfg_core::canvas::{render, InteractionState};
use partcfg_core::extrude::{extrude_config, ExtrudeOptions};
use partcfg_core::model::{PartConfig, ViewMode};
use partcfg_core::profile::build_profile;
use partcfg_core::quote::quote;
use partcfg_core::step::fallback_step;
use partcfg_core::validate::{validate_step, validate_step_file};
use partcfg_core::viewport::{compute_layout, Viewport};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "partcfg")]
#[command(about = "Plastic part configurator: previews, CAD files and orders.")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print (or write) the default part configuration as JSON.
    Template {
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report manufacturing issues, price and mesh size for a part.
    Check {
        input: PathBuf,
        #[arg(long, default_value_t = 1)]
        quantity: u32,
    },
    /// Write STEP and/or DXF files locally without contacting the backend.
    Export {
        input: PathBuf,
        #[arg(long)]
        step: Option<PathBuf>,
        #[arg(long)]
        dxf: Option<PathBuf>,
    },
    /// Ask the CAD backend for files, falling back to local generation.
    Generate {
        input: PathBuf,
        #[arg(long, default_value = "out")]
        out: PathBuf,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Place an order for a part.
    Order {
        input: PathBuf,
        #[arg(long)]
        quantity: u32,
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        notes: Option<String>,
        #[command(flatten)]
        api: ApiArgs,
    },
    /// Validate a STEP file against a part, or summarize a DXF file.
    Inspect {
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Render the 2D canvas view of a part to SVG.
    Render {
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
        #[arg(long, value_enum)]
        view: Option<ViewArg>,
    },
}

#[derive(Debug, Args)]
struct ApiArgs {
    /// Backend base URL.
    #[arg(long, env = "PARTCFG_API_URL")]
    api_url: Option<String>,
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Fail instead of writing local files when the backend errors.
    #[arg(long)]
    no_fallback: bool,
}

impl ApiArgs {
    fn client(&self) -> Result<CadClient> {
        let mut config = ClientConfig::from_env()?;
        if let Some(url) = &self.api_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(secs) = self.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        config.fallback_on_error = !self.no_fallback;
        Ok(CadClient::new(config)?)
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ViewArg {
    Front,
    Side,
    Top,
}

impl From<ViewArg> for ViewMode {
    fn from(v: ViewArg) -> Self {
        match v {
            ViewArg::Front => ViewMode::Front,
            ViewArg::Side => ViewMode::Side,
            ViewArg::Top => ViewMode::Top,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "partcfg=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Template { out } => template(out.as_deref()),
        Command::Check { input, quantity } => check(&input, quantity),
        Command::Export { input, step, dxf } => export(&input, step.as_deref(), dxf.as_deref()),
        Command::Generate { input, out, api } => generate(&input, &out, &api).await,
        Command::Order {
            input,
            quantity,
            email,
            name,
            notes,
            api,
        } => {
            let part = load_part(&input)?;
            let order = OrderRequest {
                config: (&part).into(),
                quantity,
                customer_email: email,
                customer_name: name,
                notes,
            };
            place_order(&part, &order, &api).await
        }
        Command::Inspect { file, config } => inspect(&file, config.as_deref()),
        Command::Render {
            input,
            out,
            width,
            height,
            view,
        } => render_svg(&input, &out, width, height, view),
    }
}

fn template(out: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(&PartConfig::default()).context("serialize part")?;
    match out {
        Some(path) => write_file(path, json.as_bytes(), "part"),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn check(input: &Path, quantity: u32) -> Result<()> {
    let part = load_part(input)?;
    let issues = part.validate();
    let price = quote(&part, quantity)?;
    let bbox = build_profile(&part).bbox();
    let mesh = match extrude_config(&part, &ExtrudeOptions::default()) {
        Ok(mesh) => json!({
            "vertices": mesh.vertex_count(),
            "triangles": mesh.triangle_count(),
        }),
        Err(err) => json!({ "error": err.to_string() }),
    };

    let report = json!({
        "issues": issues,
        "quote": price,
        "outline_bbox": bbox.map(|b| json!({
            "min": [b.min.x, b.min.y],
            "max": [b.max.x, b.max.y],
        })),
        "mesh": mesh,
    });
    println!("{}", serde_json::to_string_pretty(&report).context("serialize report")?);
    if !issues.is_empty() {
        warn!(count = issues.len(), "part has manufacturing issues");
    }
    Ok(())
}

fn export(input: &Path, step: Option<&Path>, dxf: Option<&Path>) -> Result<()> {
    if step.is_none() && dxf.is_none() {
        bail!("nothing to export: pass --step and/or --dxf");
    }
    let part = load_part(input)?;

    if let Some(path) = step {
        let data = fallback_step(&part, Utc::now());
        let validation = validate_step(&data, &part);
        if !validation.valid {
            bail!("generated STEP failed validation: {}", validation.errors.join("; "));
        }
        write_file(path, data.as_bytes(), "step")?;
        info!(?path, "{}", validation.message);
    }
    if let Some(path) = dxf {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        partcfg_export_dxf::write_dxf(&part, path)?;
        info!(?path, "DXF written");
    }
    Ok(())
}

async fn generate(input: &Path, out: &Path, api: &ApiArgs) -> Result<()> {
    let part = load_part(input)?;
    let client = api.client()?;
    let outcome = client.generate_cad_files(&part).await?;

    let step_path = out.join("part.step");
    let dxf_path = out.join("part.dxf");
    match &outcome {
        CadOutcome::Remote(response) => {
            let step = client.fetch_file(&response.step_file_url).await?;
            write_file(&step_path, &step, "step")?;
            let dxf = client.fetch_file(&response.dxf_file_url).await?;
            write_file(&dxf_path, &dxf, "dxf")?;
            if let Some(validation) = &response.validation {
                info!(valid = validation.valid, "{}", validation.message);
            }
        }
        CadOutcome::Fallback(files) => {
            warn!(reason = %files.reason, "using locally generated files");
            write_file(&step_path, files.step.as_bytes(), "step")?;
            write_file(&dxf_path, files.dxf.as_bytes(), "dxf")?;
        }
    }

    let metadata = serde_json::to_string_pretty(outcome.metadata()).context("serialize metadata")?;
    write_file(&out.join("metadata.json"), metadata.as_bytes(), "metadata")?;

    let summary = json!({
        "fallback": outcome.is_fallback(),
        "step": step_path,
        "dxf": dxf_path,
        "metadata": outcome.metadata(),
    });
    println!("{}", serde_json::to_string_pretty(&summary).context("serialize summary")?);
    Ok(())
}

async fn place_order(part: &PartConfig, order: &OrderRequest, api: &ApiArgs) -> Result<()> {
    let issues = part.validate();
    if !issues.is_empty() {
        let messages: Vec<_> = issues.iter().map(|i| i.message.as_str()).collect();
        bail!("part cannot be ordered: {}", messages.join(" "));
    }
    let estimate = quote(part, order.quantity)?;
    info!(total = estimate.total, "estimated price");

    let response = api.client()?.submit_order(order).await?;
    let report = json!({
        "order": response,
        "estimate": estimate,
    });
    println!("{}", serde_json::to_string_pretty(&report).context("serialize order")?);
    Ok(())
}

fn inspect(file: &Path, config: Option<&Path>) -> Result<()> {
    ensure_input_file(file)?;
    let ext = file
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let report = match ext.as_str() {
        "step" | "stp" => {
            let part = match config {
                Some(path) => load_part(path)?,
                None => bail!("STEP validation needs the part: pass --config <part.json>"),
            };
            serde_json::to_value(validate_step_file(file, &part)).context("serialize validation")?
        }
        "dxf" => {
            let summary = partcfg_export_dxf::inspect_dxf(file)?;
            json!({
                "version": summary.version,
                "outlines": summary.outlines,
                "outline_vertices": summary.outline_vertices,
                "circles": summary.circles,
                "other_entities": summary.other,
            })
        }
        _ => bail!("Unsupported file extension: .{ext}"),
    };
    println!("{}", serde_json::to_string_pretty(&report).context("serialize report")?);
    Ok(())
}

fn render_svg(input: &Path, out: &Path, width: f64, height: f64, view: Option<ViewArg>) -> Result<()> {
    if !(width > 0.0 && height > 0.0) {
        bail!("canvas size must be positive, got {width}x{height}");
    }
    let mut part = load_part(input)?;
    if let Some(view) = view {
        part.view_mode = view.into();
    }
    let layout = compute_layout(width, height, &part, &Viewport::default());
    let frame = render(&part, &layout, &InteractionState::default());
    write_file(out, svg::frame_to_svg(&frame).as_bytes(), "svg")
}

fn load_part(input: &Path) -> Result<PartConfig> {
    ensure_input_file(input)?;
    let raw = std::fs::read_to_string(input).with_context(|| format!("read part: {input:?}"))?;
    let part: PartConfig =
        serde_json::from_str(&raw).with_context(|| format!("parse part: {input:?}"))?;
    if !part.has_valid_dimensions() {
        bail!(
            "part dimensions must be positive: {} x {} x {}",
            part.width,
            part.height,
            part.thickness
        );
    }
    Ok(part)
}

fn write_file(path: &Path, data: &[u8], what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    std::fs::write(path, data).with_context(|| format!("write {what}: {path:?}"))
}

fn ensure_input_file(input: &Path) -> Result<()> {
    match std::fs::metadata(input) {
        Ok(meta) => {
            if meta.is_file() {
                Ok(())
            } else {
                bail!("input is not a file: {input:?}");
            }
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            bail!("input not found: {input:?} (cwd: {cwd:?}).");
        }
        Err(err) => Err(err).with_context(|| format!("stat input: {input:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partcfg_core::model::Hole;

    fn write_part(dir: &Path, part: &PartConfig) -> PathBuf {
        let path = dir.join("part.json");
        std::fs::write(&path, serde_json::to_string(part).unwrap()).unwrap();
        path
    }

    fn holed_part() -> PartConfig {
        PartConfig {
            holes: vec![Hole {
                id: "h1".into(),
                x: 100.0,
                y: 100.0,
                diameter: 8.0,
            }],
            ..PartConfig::default()
        }
    }

    #[test]
    fn export_writes_valid_step_and_dxf() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_part(dir.path(), &holed_part());
        let step = dir.path().join("out/part.step");
        let dxf = dir.path().join("out/part.dxf");

        export(&input, Some(&step), Some(&dxf)).unwrap();

        let validation = validate_step_file(&step, &holed_part());
        assert!(validation.valid, "{:?}", validation.errors);
        let summary = partcfg_export_dxf::inspect_dxf(&dxf).unwrap();
        assert_eq!(summary.circles, 1);
    }

    #[test]
    fn export_needs_a_target() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_part(dir.path(), &PartConfig::default());
        assert!(export(&input, None, None).is_err());
    }

    #[test]
    fn render_writes_svg_for_each_view() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_part(dir.path(), &holed_part());
        for view in [ViewArg::Front, ViewArg::Side, ViewArg::Top] {
            let out = dir.path().join(format!("{view:?}.svg"));
            render_svg(&input, &out, 640.0, 480.0, Some(view)).unwrap();
            let svg = std::fs::read_to_string(&out).unwrap();
            assert!(svg.starts_with("<svg"));
        }
        let side = std::fs::read_to_string(dir.path().join("Side.svg")).unwrap();
        assert!(side.contains("stroke-dasharray"));
    }

    #[test]
    fn rejects_missing_and_degenerate_parts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_part(&dir.path().join("nope.json")).is_err());
        assert!(load_part(dir.path()).is_err());

        let flat = PartConfig {
            thickness: 0.0,
            ..PartConfig::default()
        };
        let input = write_part(dir.path(), &flat);
        let err = load_part(&input).unwrap_err();
        assert!(err.to_string().contains("positive"));
    }

    #[test]
    fn template_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("template.json");
        template(Some(&out)).unwrap();
        assert_eq!(load_part(&out).unwrap(), PartConfig::default());
    }
}
