//! `inferenceiq config`: print a starter config file.

use inferenceiq_config::AppConfig;
use std::io::Write;

pub fn print_default() -> std::io::Result<()> {
    write_default(&mut std::io::stdout().lock())
}

fn write_default(out: &mut impl Write) -> std::io::Result<()> {
    writeln!(out, "# InferenceIQ config, save as ~/.inferenceiq/config.toml")?;
    write!(out, "{}", AppConfig::default_toml())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses_back() {
        let mut out = Vec::new();
        write_default(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let parsed: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.agent, AppConfig::default().agent);
        assert_eq!(parsed.log_file, AppConfig::default().log_file);
    }
}
