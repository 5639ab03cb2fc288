//! CLI subcommand handlers.

use crate::Commands;
use crate::ConfigAction;
use akgc_core::batch::{evaluate_batch, load_samples};
use akgc_core::knowledge::FactProvider;
use akgc_core::policy::CorrectionPolicy;
use akgc_core::{AkgcConfig, entity};
use std::path::Path;

/// Handle a CLI subcommand.
pub async fn handle_command(
    command: Commands,
    config: AkgcConfig,
    workspace: &Path,
) -> anyhow::Result<()> {
    match command {
        Commands::Correct {
            prompt,
            sim_threshold,
            hvi_threshold,
            json,
            report,
        } => handle_correct(&prompt, config, sim_threshold, hvi_threshold, json, report).await,
        Commands::Batch {
            file,
            output,
            concurrency,
        } => handle_batch(&file, output.as_deref(), concurrency, config).await,
        Commands::Facts { entity } => handle_facts(&entity, config).await,
        Commands::Entity { prompt } => handle_entity(&prompt),
        Commands::Score {
            prompt,
            response,
            json,
        } => handle_score(&prompt, &response, json, config).await,
        Commands::Config { action } => handle_config(action, config, workspace),
    }
}

/// Resolve a relative fact-cache path against the workspace.
pub fn anchor_cache_path(config: &mut AkgcConfig, workspace: &Path) {
    if config.knowledge.cache_path.is_relative() {
        config.knowledge.cache_path = workspace.join(&config.knowledge.cache_path);
    }
}

fn apply_threshold_overrides(
    config: &mut AkgcConfig,
    sim_threshold: Option<f64>,
    hvi_threshold: Option<f64>,
) -> anyhow::Result<()> {
    if let Some(value) = sim_threshold {
        config.sim_threshold = value;
    }
    if let Some(value) = hvi_threshold {
        config.hvi_threshold = value;
    }
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid threshold: {}", e))
}

async fn handle_correct(
    prompt: &str,
    mut config: AkgcConfig,
    sim_threshold: Option<f64>,
    hvi_threshold: Option<f64>,
    json: bool,
    report: bool,
) -> anyhow::Result<()> {
    apply_threshold_overrides(&mut config, sim_threshold, hvi_threshold)?;
    let policy = CorrectionPolicy::from_config(&config);
    let thresholds = policy.thresholds();

    let detailed = policy
        .correct_detailed(prompt, thresholds)
        .await
        .map_err(|e| anyhow::anyhow!("Correction failed: {}", e))?;

    if report {
        println!("{}", serde_json::to_string_pretty(&detailed)?);
    } else if json {
        println!("{}", serde_json::to_string_pretty(&detailed.result)?);
    } else {
        println!("Response: {}", detailed.result.response);
        println!(
            "Factual:  {}",
            if detailed.result.is_factual { "yes" } else { "no (corrected)" }
        );
        println!("HVI:      {:.3}", detailed.result.hvi);
        if detailed.score.context_drift {
            println!(
                "Note:     context drift (similarity {:.3} < {:.2})",
                detailed.score.similarity.value, thresholds.sim_threshold
            );
        }
    }
    Ok(())
}

async fn handle_batch(
    file: &Path,
    output: Option<&Path>,
    concurrency: usize,
    config: AkgcConfig,
) -> anyhow::Result<()> {
    let samples = load_samples(file)
        .map_err(|e| anyhow::anyhow!("Failed to load samples from {}: {}", file.display(), e))?;
    let policy = CorrectionPolicy::from_config(&config);
    let report = evaluate_batch(&policy, &samples, concurrency).await;

    let summary = &report.summary;
    println!("Run:          {}", summary.run_id);
    println!("Samples:      {}", summary.total);
    println!("Failures:     {}", summary.failures);
    println!("Corrections:  {}", summary.corrections);
    println!("Mean HVI:     {:.3}", summary.mean_hvi);
    if let Some(accuracy) = summary.mean_accuracy {
        println!("Accuracy:     {:.3}", accuracy);
    }
    if let Some(rouge) = summary.mean_rouge_l {
        println!("ROUGE-L:      {:.3}", rouge);
    }
    println!(
        "Fact sources: cache={} curated={} external={} contextual={} fallback={}",
        summary.sources.cache,
        summary.sources.curated,
        summary.sources.external,
        summary.sources.contextual,
        summary.sources.fallback
    );

    if let Some(path) = output {
        report.write(path)?;
        println!("Report written to {}", path.display());
    }
    Ok(())
}

async fn handle_facts(raw: &str, config: AkgcConfig) -> anyhow::Result<()> {
    let name = entity::normalize_entity_name(raw);
    let provider = FactProvider::from_config(&config.knowledge);
    let set = provider.resolve(&name).await;
    println!("{} ({})", name, set.source);
    for fact in &set.facts {
        println!("  - {}", fact);
    }
    Ok(())
}

fn handle_entity(prompt: &str) -> anyhow::Result<()> {
    let extraction = entity::extract(prompt);
    println!("{}", extraction.entity);
    println!("  raw:    {}", extraction.raw);
    println!("  source: {}", serde_json::to_string(&extraction.source)?);
    Ok(())
}

async fn handle_score(
    prompt: &str,
    response: &str,
    json: bool,
    config: AkgcConfig,
) -> anyhow::Result<()> {
    let policy = CorrectionPolicy::from_config(&config);
    let score = policy.score(prompt, response).await;
    if json {
        println!("{}", serde_json::to_string_pretty(&score)?);
        return Ok(());
    }
    println!("Entity:     {} ({})", score.entity.entity, score.fact_source);
    println!(
        "Similarity: {:.3} ({:?})",
        score.similarity.value, score.similarity.method
    );
    println!("Grounding:  {:.3}", score.grounding.score);
    println!("HVI:        {:.3}", score.hvi);
    println!("Supported:  {}", score.supported);
    Ok(())
}

fn handle_config(action: ConfigAction, config: AkgcConfig, workspace: &Path) -> anyhow::Result<()> {
    match action {
        ConfigAction::Show => {
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
        ConfigAction::Init => {
            let config_path = init_workspace_config(workspace)?;
            println!("Configuration file: {}", config_path.display());
            Ok(())
        }
    }
}

/// Write the default config under the workspace unless one already exists.
fn init_workspace_config(workspace: &Path) -> anyhow::Result<std::path::PathBuf> {
    let config_dir = workspace.join(".akgc");
    std::fs::create_dir_all(&config_dir)?;
    let config_path = config_dir.join("config.toml");
    if !config_path.exists() {
        let toml_str = toml::to_string_pretty(&AkgcConfig::default())?;
        std::fs::write(&config_path, toml_str)?;
        tracing::info!(path = %config_path.display(), "Created default configuration");
    }
    Ok(config_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_anchor_cache_path() {
        let workspace = Path::new("/srv/project");
        let mut config = AkgcConfig::default();
        anchor_cache_path(&mut config, workspace);
        assert_eq!(
            config.knowledge.cache_path,
            workspace.join(".akgc").join("kg_cache.json")
        );

        let absolute = std::env::temp_dir().join("kg.json");
        config.knowledge.cache_path = absolute.clone();
        anchor_cache_path(&mut config, workspace);
        assert_eq!(config.knowledge.cache_path, absolute);
    }

    #[test]
    fn test_threshold_overrides_are_validated() {
        let mut config = AkgcConfig::default();
        apply_threshold_overrides(&mut config, Some(0.5), Some(0.9)).unwrap();
        assert_eq!(config.sim_threshold, 0.5);
        assert_eq!(config.hvi_threshold, 0.9);
        assert!(apply_threshold_overrides(&mut config, None, Some(1.5)).is_err());
    }

    #[test]
    fn test_init_workspace_config_round_trips() {
        let dir = TempDir::new().unwrap();
        let path = init_workspace_config(dir.path()).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: AkgcConfig = toml::from_str(&content).unwrap();
        assert_eq!(parsed.hvi_threshold, AkgcConfig::default().hvi_threshold);

        // an existing file is left alone
        std::fs::write(&path, "hvi_threshold = 0.9\n").unwrap();
        init_workspace_config(dir.path()).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hvi_threshold = 0.9\n");
    }

    #[tokio::test]
    async fn test_correct_offline() {
        let dir = TempDir::new().unwrap();
        let mut config = AkgcConfig::default();
        config.generation.provider = "echo".into();
        config.knowledge.external_lookup = false;
        anchor_cache_path(&mut config, dir.path());
        handle_correct("The capital of France is Florida.", config, None, None, true, false)
            .await
            .unwrap();
        assert!(dir.path().join(".akgc").join("kg_cache.json").exists());
    }
}
