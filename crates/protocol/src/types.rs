//! Core types used across the WebAuthn domain wire.

use serde::{Deserialize, Serialize};

/// Authenticator protocol variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorProtocol {
    /// CTAP2 (default for new authenticators)
    #[default]
    Ctap2,
    /// Legacy U2F
    U2f,
}

/// Simulated transport the authenticator reports to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthenticatorTransport {
    /// USB HID (default)
    #[default]
    Usb,
    /// NFC tap
    Nfc,
    /// Bluetooth Low Energy
    Ble,
    /// Platform authenticator built into the device
    Internal,
}

/// A key-material record created against an authenticator by the page.
///
/// Credentials are only ever mirrored from the remote side; the panel never
/// constructs one locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    /// Opaque credential identifier
    pub credential_id: String,
    /// Whether the credential is stored on the authenticator itself
    pub is_resident_credential: bool,
    /// Relying party this credential was created for (absent for U2F)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rp_id: Option<String>,
    /// User handle supplied at creation (may be absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<String>,
    /// Signature counter, monotonically increasing on the remote side
    pub sign_count: u32,
    /// Base64-encoded exportable private key
    pub private_key: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protocol_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AuthenticatorProtocol::Ctap2).unwrap(),
            "ctap2"
        );
        assert_eq!(
            serde_json::to_value(AuthenticatorProtocol::U2f).unwrap(),
            "u2f"
        );
    }

    #[test]
    fn transport_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(AuthenticatorTransport::Internal).unwrap(),
            "internal"
        );
    }

    #[test]
    fn credential_deserializes_wire_shape() {
        let json = serde_json::json!({
            "credentialId": "Y3JlZA==",
            "isResidentCredential": true,
            "rpId": "example.com",
            "signCount": 3,
            "privateKey": "a2V5"
        });
        let credential: Credential = serde_json::from_value(json).unwrap();
        assert_eq!(credential.credential_id, "Y3JlZA==");
        assert!(credential.is_resident_credential);
        assert_eq!(credential.rp_id.as_deref(), Some("example.com"));
        assert_eq!(credential.user_handle, None);
        assert_eq!(credential.sign_count, 3);
    }
}
