use std::io::Cursor;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::writer::Writer;
use secrecy::{ExposeSecret, SecretString};

use crate::error::WifiResult;
use crate::wifi::WifiManager;

/// Security configuration for a profile handed to the OS for storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Security {
    /// WPA2-PSK with AES/CCMP, the default for password-protected networks.
    #[default]
    Wpa2Psk,
    Open,
}

/// A network profile constructed during a connect attempt. Saved profiles
/// are owned by the OS; this is only the value we hand over, never a copy
/// of what the OS keeps.
#[derive(Debug, Clone)]
pub struct ProfileSpec {
    pub ssid: String,
    pub credential: Option<SecretString>,
    pub security: Security,
}

impl ProfileSpec {
    pub fn protected(ssid: &str, credential: SecretString) -> Self {
        Self {
            ssid: ssid.to_string(),
            credential: Some(credential),
            security: Security::Wpa2Psk,
        }
    }

    pub fn open(ssid: &str) -> Self {
        Self {
            ssid: ssid.to_string(),
            credential: None,
            security: Security::Open,
        }
    }

    /// Render the WLAN profile document `netsh wlan add profile` expects.
    /// Going through a writer keeps SSIDs and keys with XML metacharacters
    /// intact.
    pub fn to_windows_xml(&self) -> String {
        let mut writer = Writer::new(Cursor::new(Vec::new()));
        let _ = writer.write_event(Event::Decl(BytesDecl::new("1.0", None, None)));

        let mut wlan_profile = BytesStart::new("WLANProfile");
        wlan_profile.push_attribute((
            "xmlns",
            "http://www.microsoft.com/networking/WLAN/profile/v1",
        ));
        let _ = writer.write_event(Event::Start(wlan_profile));

        write_element(&mut writer, "name", &self.ssid);

        let _ = writer.write_event(Event::Start(BytesStart::new("SSIDConfig")));
        let _ = writer.write_event(Event::Start(BytesStart::new("SSID")));
        write_element(&mut writer, "name", &self.ssid);
        let _ = writer.write_event(Event::End(BytesEnd::new("SSID")));
        let _ = writer.write_event(Event::End(BytesEnd::new("SSIDConfig")));

        write_element(&mut writer, "connectionType", "ESS");
        write_element(&mut writer, "connectionMode", "manual");

        let _ = writer.write_event(Event::Start(BytesStart::new("MSM")));
        let _ = writer.write_event(Event::Start(BytesStart::new("security")));
        let _ = writer.write_event(Event::Start(BytesStart::new("authEncryption")));

        let (auth, cipher) = match self.security {
            Security::Wpa2Psk => ("WPA2PSK", "AES"),
            Security::Open => ("open", "none"),
        };
        write_element(&mut writer, "authentication", auth);
        write_element(&mut writer, "encryption", cipher);
        write_element(&mut writer, "useOneX", "false");
        let _ = writer.write_event(Event::End(BytesEnd::new("authEncryption")));

        if let Some(credential) = &self.credential {
            let _ = writer.write_event(Event::Start(BytesStart::new("sharedKey")));
            write_element(&mut writer, "keyType", "passPhrase");
            write_element(&mut writer, "protected", "false");
            write_element(&mut writer, "keyMaterial", credential.expose_secret());
            let _ = writer.write_event(Event::End(BytesEnd::new("sharedKey")));
        }

        let _ = writer.write_event(Event::End(BytesEnd::new("security")));
        let _ = writer.write_event(Event::End(BytesEnd::new("MSM")));

        let _ = writer.write_event(Event::End(BytesEnd::new("WLANProfile")));

        String::from_utf8(writer.into_inner().into_inner()).unwrap_or_default()
    }
}

impl WifiManager {
    /// Look up a saved profile by exact, case-sensitive SSID. Absence is not
    /// an error; the query itself never modifies anything.
    pub fn find_profile(&self, ssid: &str) -> WifiResult<Option<String>> {
        let profiles = self.backend().saved_profiles()?;
        Ok(profiles.into_iter().find(|name| name == ssid))
    }

    /// Names of every profile the OS has saved.
    pub fn saved_profile_names(&self) -> WifiResult<Vec<String>> {
        self.backend().saved_profiles()
    }
}

fn write_element<W: std::io::Write>(writer: &mut Writer<W>, name: &str, value: &str) {
    let _ = writer.write_event(Event::Start(BytesStart::new(name)));
    let _ = writer.write_event(Event::Text(BytesText::new(value)));
    let _ = writer.write_event(Event::End(BytesEnd::new(name)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protected_profile_xml() {
        let profile = ProfileSpec::protected("HomeNet", SecretString::from("hunter22".to_string()));
        let xml = profile.to_windows_xml();

        assert!(xml.starts_with("<?xml version=\"1.0\"?>"));
        assert!(xml.contains("<name>HomeNet</name>"));
        assert!(xml.contains("<authentication>WPA2PSK</authentication>"));
        assert!(xml.contains("<encryption>AES</encryption>"));
        assert!(xml.contains("<keyMaterial>hunter22</keyMaterial>"));
    }

    #[test]
    fn open_profile_has_no_shared_key() {
        let xml = ProfileSpec::open("CoffeeShop").to_windows_xml();

        assert!(xml.contains("<authentication>open</authentication>"));
        assert!(xml.contains("<encryption>none</encryption>"));
        assert!(!xml.contains("sharedKey"));
    }

    #[test]
    fn xml_metacharacters_are_escaped() {
        let profile =
            ProfileSpec::protected("Tom & Jerry <guest>", SecretString::from("a<b&c".to_string()));
        let xml = profile.to_windows_xml();

        assert!(xml.contains("<name>Tom &amp; Jerry &lt;guest&gt;</name>"));
        assert!(xml.contains("<keyMaterial>a&lt;b&amp;c</keyMaterial>"));
    }
}
