//! Bilingual (English/Tamil) user-facing text.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilingualMessage {
    pub english: String,
    pub tamil: String,
}

impl BilingualMessage {
    pub fn new(english: impl Into<String>, tamil: impl Into<String>) -> Self {
        Self {
            english: english.into(),
            tamil: tamil.into(),
        }
    }

    pub fn invalid_format() -> Self {
        Self::new(
            "Invalid format. Use: B-YYYY:XX-XXXX-XXXXXX",
            "தவறான வடிவம். பயன்படுத்தவும்: B-YYYY:XX-XXXX-XXXXXX",
        )
    }

    pub fn invalid_year(min_year: i32, max_year: i32) -> Self {
        Self::new(
            format!("Invalid year. Must be {min_year}-{max_year}"),
            format!("தவறான வருடம். {min_year}-{max_year} இடையில் இருக்க வேண்டும்"),
        )
    }

    /// Shown for both a confirmed miss and an exhausted network retry.
    pub fn certificate_not_found() -> Self {
        Self::new(
            "Certificate not found. Please check the registration number and try again.",
            "சான்றிதழ் இல்லை. பதிவு எண்ணை சரிபார்த்து மீண்டும் முயற்சிக்கவும்.",
        )
    }

    pub fn server_unreachable() -> Self {
        Self::new(
            "Unable to connect to the certificate server. Please check your internet connection and try again.",
            "சான்றிதழ் சேவையகத்துடன் இணைக்க முடியவில்லை. உங்கள் இணைய இணைப்பை சரிபார்த்து மீண்டும் முயற்சிக்கவும்.",
        )
    }
}

impl fmt::Display for BilingualMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} / {}", self.english, self.tamil)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmitLabel {
    #[default]
    ViewCertificate,
    SearchAgain,
}

impl SubmitLabel {
    pub fn text(self) -> BilingualMessage {
        match self {
            SubmitLabel::ViewCertificate => {
                BilingualMessage::new("View Certificate", "சான்றிதழ் காண்க")
            }
            SubmitLabel::SearchAgain => BilingualMessage::new("Search Again", "மீண்டும் தேடு"),
        }
    }
}
