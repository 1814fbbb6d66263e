use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, info_span, warn};

use postop_cli::input::collect_input;
use postop_cli::summary::{fields_table, report_table, verify_table};
use postop_infer::{ScoringOptions, score};
use postop_model::{ComplicationKey, EncodingScheme, RawInput};
use postop_normalize::{FormField, apply_defaults, form_fields};
use postop_registry::{LoadOptions, ModelRegistry};

use crate::cli::{FieldsArgs, ModelArgs, OutputFormatArg, PredictArgs, VerifyArgs};

/// Fields of one scheme and the complications that use it.
#[derive(Serialize)]
struct SchemeFields {
    scheme: String,
    complications: Vec<ComplicationKey>,
    fields: Vec<FormField>,
}

pub fn run_fields(args: &FieldsArgs) -> Result<()> {
    let groups = match &args.models {
        Some(dir) => {
            let registry = open_models_dir(dir, LoadOptions::default())?;
            let keys = selected_keys(&registry, &args.complications);
            scheme_groups(&registry, &keys)?
        }
        None => {
            let name = args.scheme.preset_name();
            let scheme = EncodingScheme::preset(name)
                .with_context(|| format!("unknown preset scheme {name}"))?;
            vec![(scheme, Vec::new())]
        }
    };

    let output: Vec<SchemeFields> = groups
        .into_iter()
        .map(|(scheme, complications)| SchemeFields {
            fields: form_fields(&scheme),
            scheme: scheme.name,
            complications,
        })
        .collect();

    match args.format {
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&output)?),
        OutputFormatArg::Table => {
            for group in &output {
                let used_by: Vec<&str> = group
                    .complications
                    .iter()
                    .map(ComplicationKey::as_str)
                    .collect();
                if used_by.is_empty() {
                    println!("Scheme: {}", group.scheme);
                } else {
                    println!("Scheme: {} ({})", group.scheme, used_by.join(", "));
                }
                println!("{}", fields_table(&group.fields));
            }
        }
    }
    Ok(())
}

pub fn run_predict(args: &PredictArgs) -> Result<()> {
    let registry = open_registry(&args.model)?;
    let keys = selected_keys(&registry, &args.complications);
    let mut raw = collect_input(args.input.as_deref(), &args.set)?;

    if args.fill_defaults {
        for (scheme, _) in scheme_groups(&registry, &keys)? {
            fill_defaults(&mut raw, &form_fields(&scheme));
        }
    }

    let options = ScoringOptions {
        want_labels: !args.no_labels,
    };
    let report = score(&registry, &keys, &raw, &options)?;

    match args.format {
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormatArg::Table => println!("{}", report_table(&report)),
    }
    Ok(())
}

pub fn run_verify(args: &VerifyArgs) -> Result<()> {
    let span = info_span!("verify", models_dir = %args.model.models.display());
    let _guard = span.enter();

    let registry = open_registry(&args.model)?;
    let summary = registry.verify()?;
    info!(model_count = summary.model_count, "models verified");

    match args.format {
        OutputFormatArg::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        OutputFormatArg::Table => {
            println!("Models: {}", summary.models_dir.display());
            println!("{}", verify_table(&summary));
        }
    }
    Ok(())
}

fn open_registry(args: &ModelArgs) -> Result<ModelRegistry> {
    let options =
        LoadOptions::default().with_timeout(Duration::from_secs(args.load_timeout_secs));
    open_models_dir(&args.models, options)
}

fn open_models_dir(dir: &Path, options: LoadOptions) -> Result<ModelRegistry> {
    ModelRegistry::open(dir, options)
        .with_context(|| format!("open models directory {}", dir.display()))
}

fn selected_keys(registry: &ModelRegistry, requested: &[ComplicationKey]) -> Vec<ComplicationKey> {
    if requested.is_empty() {
        registry.keys()
    } else {
        requested.to_vec()
    }
}

/// Distinct schemes of the selected models, in first-use order.
fn scheme_groups(
    registry: &ModelRegistry,
    keys: &[ComplicationKey],
) -> Result<Vec<(EncodingScheme, Vec<ComplicationKey>)>> {
    let mut groups: Vec<(EncodingScheme, Vec<ComplicationKey>)> = Vec::new();
    for key in keys {
        let variant = registry.get(*key)?;
        match groups
            .iter_mut()
            .find(|(scheme, _)| scheme.name == variant.scheme.name)
        {
            Some((_, users)) => {
                if !users.contains(key) {
                    users.push(*key);
                }
            }
            None => groups.push((variant.scheme.clone(), vec![*key])),
        }
    }
    Ok(groups)
}

fn fill_defaults(raw: &mut RawInput, fields: &[FormField]) {
    let filled = apply_defaults(raw, fields);
    if !filled.is_empty() {
        warn!(
            count = filled.len(),
            variables = %filled.join(", "),
            "missing inputs filled with form defaults"
        );
    }
}
