#[cfg(test)]
mod tests {
    use crate::config::*;
    use crate::exercise::ExerciseKind;
    use crate::phase::{Phase, PhaseBand};
    use std::env;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Environment is process-global; tests that read or write REPCOUNT_*
    // variables hold this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config_valid() {
        let config = RepcountConfig::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation_session() {
        let mut config = RepcountConfig::default();

        config.session.confidence_floor = 1.5;
        assert!(config.validate().is_err());

        config.session.confidence_floor = 0.5;
        config.session.calibration_window = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_coach() {
        let mut config = RepcountConfig::default();
        config.coach.queue_capacity = 0;
        assert!(config.validate().is_err());

        let mut config = RepcountConfig::default();
        config.coach.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_exercise_override_rejected() {
        let mut config = RepcountConfig::default();
        config
            .exercises
            .insert("burpee".to_string(), ExerciseOverride::default());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_override_breaking_hysteresis_rejected() {
        let mut config = RepcountConfig::default();
        config.exercises.insert(
            "pelvic_tilt".to_string(),
            ExerciseOverride {
                bands: Some(vec![PhaseBand::above(Phase::Tilted, 0.01, 0.02)]),
                ..Default::default()
            },
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Hysteresis { .. })
        ));
    }

    #[test]
    fn test_session_window_applies_to_calibrated_exercises_only() {
        let mut config = RepcountConfig::default();
        config.session.calibration_window = 12;

        assert_eq!(
            config.exercise(ExerciseKind::CatCow).unwrap().calibration_window,
            12
        );
        assert_eq!(
            config.exercise(ExerciseKind::Squat).unwrap().calibration_window,
            0
        );
    }

    #[test]
    fn test_config_to_toml_string() {
        let config = RepcountConfig::default();
        let toml_str = config.to_toml_string().unwrap();

        assert!(toml_str.contains("[session]"));
        assert!(toml_str.contains("[coach]"));
        assert!(toml_str.contains("confidence_floor"));
        assert!(toml_str.contains("queue_capacity"));
    }

    #[test]
    fn test_config_from_toml_string() {
        let toml_str = r#"
            [session]
            confidence_floor = 0.6
            calibration_window = 20
            collapse_repeats = false

            [coach]
            enabled = true
            interval_secs = 5
            queue_capacity = 2
            shutdown_timeout_ms = 500

            [exercises.chin_tuck]
            calibration_window = 45

            [exercises.squat]
            rep_gate_percent = 55.0
        "#;

        let config: RepcountConfig = toml::from_str(toml_str).unwrap();
        assert!(config.validate().is_ok());

        assert_eq!(config.session.confidence_floor, 0.6);
        assert!(!config.session.collapse_repeats);
        assert!(config.coach.enabled);
        assert_eq!(config.coach.interval_secs, 5);

        let chin = config.exercise(ExerciseKind::ChinTuck).unwrap();
        assert_eq!(chin.calibration_window, 45);
        let pelvic = config.exercise(ExerciseKind::PelvicTilt).unwrap();
        assert_eq!(pelvic.calibration_window, 20);
        let squat = config.exercise(ExerciseKind::Squat).unwrap();
        let gate = squat.rep_gate.unwrap();
        assert_eq!(gate.min_percent, 55.0);
        assert_eq!(gate.cue, "Go deeper");
    }

    #[test]
    fn test_partial_config_with_defaults() {
        let toml_str = r#"
            [coach]
            enabled = true
        "#;

        let config: RepcountConfig = toml::from_str(toml_str).unwrap();
        assert!(config.coach.enabled);
        assert_eq!(config.coach.queue_capacity, 2);
        assert_eq!(config.session.calibration_window, 30);
        assert!(config.exercises.is_empty());
    }

    #[test]
    fn test_config_save_and_load() {
        let mut config = RepcountConfig::default();
        config.exercises.insert(
            "cat_cow".to_string(),
            ExerciseOverride {
                history_capacity: Some(6),
                ..Default::default()
            },
        );

        let temp_file = NamedTempFile::new().unwrap();
        let path = temp_file.path();
        config.save_to_file(path).unwrap();

        let loaded = RepcountConfig::from_file(path).unwrap();

        assert_eq!(
            config.session.confidence_floor,
            loaded.session.confidence_floor
        );
        assert_eq!(config.exercises, loaded.exercises);
        assert_eq!(
            loaded.exercise(ExerciseKind::CatCow).unwrap().history_capacity,
            6
        );
    }

    #[test]
    fn test_config_env_overrides() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        env::set_var("REPCOUNT_CONFIDENCE_FLOOR", "0.7");
        env::set_var("REPCOUNT_CALIBRATION_WINDOW", "15");
        env::set_var("REPCOUNT_COACH_ENABLED", "true");
        env::set_var("REPCOUNT_COACH_INTERVAL_SECS", "8");
        env::set_var("REPCOUNT_COACH_QUEUE_CAPACITY", "4");

        let mut config = RepcountConfig::default();
        config.apply_env_overrides().unwrap();

        assert_eq!(config.session.confidence_floor, 0.7);
        assert_eq!(config.session.calibration_window, 15);
        assert!(config.coach.enabled);
        assert_eq!(config.coach.interval_secs, 8);
        assert_eq!(config.coach.queue_capacity, 4);

        env::set_var("REPCOUNT_COACH_QUEUE_CAPACITY", "many");
        let mut config = RepcountConfig::default();
        assert!(config.apply_env_overrides().is_err());

        env::remove_var("REPCOUNT_CONFIDENCE_FLOOR");
        env::remove_var("REPCOUNT_CALIBRATION_WINDOW");
        env::remove_var("REPCOUNT_COACH_ENABLED");
        env::remove_var("REPCOUNT_COACH_INTERVAL_SECS");
        env::remove_var("REPCOUNT_COACH_QUEUE_CAPACITY");
    }

    #[test]
    fn test_config_layered_loading() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let default_file = NamedTempFile::new().unwrap();
        let user_file = NamedTempFile::new().unwrap();

        let mut default_config = RepcountConfig::default();
        default_config.exercises.insert(
            "chin_tuck".to_string(),
            ExerciseOverride {
                calibration_window: Some(40),
                ..Default::default()
            },
        );
        default_config.save_to_file(default_file.path()).unwrap();

        let mut user_config = RepcountConfig::default();
        user_config.coach.interval_secs = 6;
        user_config.exercises.insert(
            "squat".to_string(),
            ExerciseOverride {
                rep_gate_percent: Some(50.0),
                ..Default::default()
            },
        );
        user_config.save_to_file(user_file.path()).unwrap();

        let loaded =
            RepcountConfig::load_layered(Some(default_file.path()), Some(user_file.path()))
                .unwrap();

        assert_eq!(loaded.coach.interval_secs, 6);
        assert!(loaded.exercises.contains_key("chin_tuck"));
        assert!(loaded.exercises.contains_key("squat"));
    }

    #[test]
    fn test_session_from_config() {
        let config = RepcountConfig::default();
        let session = config.session(ExerciseKind::NeckRotation).unwrap();
        assert_eq!(session.config().kind, ExerciseKind::NeckRotation);
    }

    #[test]
    fn test_config_file_not_found() {
        let result = RepcountConfig::from_file("nonexistent.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_invalid_toml_syntax() {
        let temp_file = NamedTempFile::new().unwrap();
        fs::write(temp_file.path(), "invalid toml: syntax").unwrap();

        let result = RepcountConfig::from_file(temp_file.path());
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_config_roundtrip() {
        let original = RepcountConfig::default();
        let toml_str = original.to_toml_string().unwrap();
        let roundtrip: RepcountConfig = toml::from_str(&toml_str).unwrap();

        assert!(roundtrip.validate().is_ok());
        assert_eq!(
            original.session.calibration_window,
            roundtrip.session.calibration_window
        );
        assert_eq!(
            original.coach.shutdown_timeout_ms,
            roundtrip.coach.shutdown_timeout_ms
        );
    }
}
