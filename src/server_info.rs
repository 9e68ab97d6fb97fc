use serde::Serialize;

pub const APP_NAME: &str = "teamshook";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Serialize)]
pub struct ServerInfo {
    message: String,
    version: String,
}

impl ServerInfo {
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            message: format!("{}, ready for action!", APP_NAME),
            version: APP_VERSION.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_server_info() {
        let info = serde_json::to_value(ServerInfo::new()).unwrap();

        assert_eq!(
            info,
            serde_json::json!({
                "message": "teamshook, ready for action!",
                "version": APP_VERSION,
            })
        );
    }
}
