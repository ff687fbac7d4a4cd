use carbon_gate::config::{ConfigError, EngineConfig, GateFile, RawConfig, ALTERNATIVE_INTENSITY_G_KWH};
use carbon_gate::estimate::Estimator;
use carbon_gate::gate::GatePolicy;
use carbon_gate_models::cooling::CoolingKind;

const GATE_FILE: &str = r#"
carbon-gate:
  job:
    gpu: A10G
    hours: 6
    region: eu-north-1
    ambient_temp_c: 12.5
    carbon_intensity: 35
    monthly_budget_kg: 20
    monthly_used_kg: 4.5
    previous_emissions_kg: 0.4
    alternative_available: true
    workload:
      params_billions: 13
  engine:
    warn_threshold: 0.05
    lookahead_h: 24
    alternative_cooling: air
    static_profiles:
      eu-north-1: [30, 30, 28, 25, 22, 20, 22, 28, 35, 40, 42, 40, 38, 36, 35, 36, 38, 42, 45, 44, 40, 36, 33, 31]
"#;

#[test]
fn test_default_config_matches_reference_constants() {
    let config = EngineConfig::from_raw(RawConfig::default()).unwrap();
    assert_eq!(config, EngineConfig::default());
    assert_eq!(config.gate, GatePolicy::default());
    assert_eq!(config.gate.warn_threshold, 0.10);
    assert_eq!(config.gate.soft_block_threshold, 0.50);
    assert_eq!(config.lookahead_h, 48);
    assert_eq!(config.daily_harmonics, 5);
    assert_eq!(config.weekly_harmonics, 2);
    assert_eq!(config.alternative_intensity, ALTERNATIVE_INTENSITY_G_KWH);
    assert_eq!(config.alternative_cooling, CoolingKind::GroundLoop);
    assert!(config.static_profiles.is_empty());
}

#[test]
fn test_gate_file() {
    let (job, config) = GateFile::parse(GATE_FILE).unwrap().into_parts().unwrap();
    assert_eq!(job.gpu, "A10G");
    assert_eq!(job.hours, 6.);
    assert_eq!(job.carbon_intensity, Some(35.));
    assert_eq!(job.intensity_sigma, None);
    assert!(job.intensity_history.is_empty());
    assert_eq!(job.primary_cooling, CoolingKind::Air);
    assert_eq!(job.workload.params_billions, 13.);
    assert_eq!(job.workload.queries_per_day, 10_000.);
    assert_eq!(job.workload.deployment_days, 360.);

    assert_eq!(config.gate.warn_threshold, 0.05);
    assert_eq!(config.gate.soft_block_threshold, 0.50);
    assert_eq!(config.lookahead_h, 24);
    assert_eq!(config.alternative_cooling, CoolingKind::Air);
    assert_eq!(config.static_profiles.get("eu-north-1").unwrap().at(5), 20.);

    let estimate = Estimator::new(config).estimate(&job).unwrap();
    assert_eq!(estimate.gpu, "A10G");
    assert_eq!(estimate.forecast.optimal_wait_h, 5);
}

#[test]
fn test_engine_section_is_optional() {
    let file = "carbon-gate:\n  job:\n    gpu: T4\n";
    let (job, config) = GateFile::parse(file).unwrap().into_parts().unwrap();
    assert_eq!(job.gpu, "T4");
    assert_eq!(job.region, "us-east-1");
    assert_eq!(config, EngineConfig::default());
}

#[test]
fn test_invalid_config() {
    let profile = RawConfig {
        static_profiles: [("us-east-1".to_string(), vec![1.; 12])].into_iter().collect(),
        ..RawConfig::default()
    };
    assert!(matches!(
        EngineConfig::from_raw(profile),
        Err(ConfigError::ProfileLength { len: 12, .. })
    ));

    let thresholds = RawConfig {
        warn_threshold: Some(0.3),
        soft_block_threshold: Some(0.2),
        ..RawConfig::default()
    };
    assert!(matches!(
        EngineConfig::from_raw(thresholds),
        Err(ConfigError::OutOfRange {
            name: "soft_block_threshold",
            ..
        })
    ));

    let harmonics = RawConfig {
        weekly_harmonics: Some(7),
        ..RawConfig::default()
    };
    assert!(matches!(
        EngineConfig::from_raw(harmonics),
        Err(ConfigError::TooManyHarmonics { value: 7, max: 6, .. })
    ));

    let utilization = RawConfig {
        gpu_utilization: Some(1.5),
        ..RawConfig::default()
    };
    assert!(EngineConfig::from_raw(utilization).is_err());

    assert!(matches!(
        GateFile::parse("carbon-gate: [1, 2]"),
        Err(ConfigError::Yaml(_))
    ));
}
