//! Tests for value validation.

use super::*;

fn with_cli(args: &[&str]) -> Result<ValidatedConfig, ConfigError> {
    ValidatedConfig::from_raw(&cli(args), Some(&minimal()))
}

mod name {
    use super::*;

    #[test]
    fn empty_name_rejected() {
        assert!(matches!(
            with_cli(&["--name", ""]),
            Err(ConfigError::InvalidName { .. })
        ));
    }

    #[test]
    fn name_of_24_characters_accepted() {
        let name = "a".repeat(24);
        assert!(with_cli(&["--name", &name]).is_ok());
    }

    #[test]
    fn name_of_25_characters_rejected() {
        let name = "a".repeat(25);
        assert!(matches!(
            with_cli(&["--name", &name]),
            Err(ConfigError::InvalidName { .. })
        ));
    }

    #[test]
    fn punctuation_allowed_by_ipset_accepted() {
        assert!(with_cli(&["--name", "ssh_guard-1.0"]).is_ok());
    }

    #[test]
    fn whitespace_rejected() {
        let error = with_cli(&["--name", "ssh guard"]).unwrap_err();
        assert!(error.to_string().contains("' ' is not allowed"));
    }
}

mod reject_prefix {
    use super::*;

    #[test]
    fn bounds_accepted() {
        assert_eq!(with_cli(&["--reject-prefix", "0"]).unwrap().reject_prefix.get(), 0);
        assert_eq!(with_cli(&["--reject-prefix", "32"]).unwrap().reject_prefix.get(), 32);
    }

    #[test]
    fn above_32_rejected() {
        assert!(matches!(
            with_cli(&["--reject-prefix", "33"]),
            Err(ConfigError::InvalidPrefixLen(_))
        ));
    }

    #[test]
    fn negative_from_file_rejected() {
        let file = file(
            r#"
            [firewall]
            name = "fw"

            [reject]
            prefix_len = -1

            [files."/var/log/a.log"]
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&file));

        assert!(matches!(result, Err(ConfigError::InvalidPrefixLen(_))));
    }
}

mod durations {
    use super::*;

    #[test]
    fn zero_debounce_rejected() {
        assert!(matches!(
            with_cli(&["--debounce-ms", "0"]),
            Err(ConfigError::InvalidDuration { field: "monitor.debounce_ms", .. })
        ));
    }

    #[test]
    fn max_wait_below_debounce_rejected() {
        assert!(matches!(
            with_cli(&["--debounce-ms", "200", "--max-wait-ms", "150"]),
            Err(ConfigError::InvalidDuration { field: "monitor.max_wait_ms", .. })
        ));
    }

    #[test]
    fn zero_reject_timeout_rejected() {
        assert!(matches!(
            with_cli(&["--reject-timeout", "0"]),
            Err(ConfigError::InvalidDuration { field: "reject.timeout", .. })
        ));
    }

    #[test]
    fn empty_search_path_rejected() {
        assert!(matches!(
            with_cli(&["--search-path", "::"]),
            Err(ConfigError::InvalidSearchPath { .. })
        ));
    }
}

mod retry {
    use super::*;

    #[test]
    fn zero_attempts_rejected() {
        assert!(matches!(
            with_cli(&["--retry-max", "0"]),
            Err(ConfigError::InvalidRetry(_))
        ));
    }

    #[test]
    fn zero_initial_delay_rejected() {
        assert!(matches!(
            with_cli(&["--retry-delay-ms", "0"]),
            Err(ConfigError::InvalidRetry(_))
        ));
    }

    #[test]
    fn non_positive_multiplier_rejected() {
        let file = file(
            r#"
            [firewall]
            name = "fw"

            [retry]
            multiplier = 0.0

            [files."/var/log/a.log"]
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&file));

        assert!(matches!(result, Err(ConfigError::InvalidRetry(_))));
    }

    #[test]
    fn explicit_cap_below_initial_delay_rejected() {
        let file = file(
            r#"
            [firewall]
            name = "fw"

            [retry]
            initial_delay_ms = 500
            max_delay_ms = 100

            [files."/var/log/a.log"]
        "#,
        );

        let result = ValidatedConfig::from_raw(&cli(&[]), Some(&file));

        assert!(matches!(result, Err(ConfigError::InvalidRetry(_))));
    }
}
