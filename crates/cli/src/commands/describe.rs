//! `loggerforge describe`: Show what one instrument contributes.

use loggerforge_assembler::describe;
use loggerforge_core::InstrumentSettings;
use loggerforge_instruments::builtin_catalog;

pub fn run(
    type_id: &str,
    sdi12: Option<String>,
    elevation: Option<i32>,
    params: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings(sdi12, elevation, params)?;
    let catalog = builtin_catalog();
    let instrument = catalog.instantiate(type_id, &settings)?;
    println!("{}", describe(instrument.as_ref())?);
    Ok(())
}

fn settings(
    sdi12: Option<String>,
    elevation: Option<i32>,
    params: &[String],
) -> Result<InstrumentSettings, Box<dyn std::error::Error>> {
    let mut settings = InstrumentSettings {
        sdi12_address: sdi12.map(|a| a.parse()).transpose()?,
        elevation,
        ..Default::default()
    };
    for param in params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| format!("Expected KEY=VALUE, got '{param}'"))?;
        // Numbers and booleans keep their type; anything else is text.
        let value = serde_json::from_str(value.trim())
            .unwrap_or_else(|_| serde_json::Value::String(value.trim().to_string()));
        settings.params.insert(key.trim().to_string(), value);
    }
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_keep_their_type() {
        let s = settings(
            Some("3".into()),
            Some(-10),
            &["pyran_calib=5.27".into(), "modbus_host = 10.0.0.2".into()],
        )
        .unwrap();
        assert_eq!(s.sdi12_address.unwrap().as_char(), '3');
        assert_eq!(s.params["pyran_calib"], serde_json::json!(5.27));
        assert_eq!(s.params["modbus_host"], serde_json::json!("10.0.0.2"));
    }

    #[test]
    fn malformed_param_rejected() {
        assert!(settings(None, None, &["pyran_calib".into()]).is_err());
        assert!(settings(Some("12".into()), None, &[]).is_err());
    }
}
