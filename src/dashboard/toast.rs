use core::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastVariant {
    Default,
    Destructive,
}

/// Notification surfaced after a user action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub title: String,
    pub description: String,
    pub variant: ToastVariant,
}

impl Toast {
    pub fn success(description: &str) -> Self {
        Self {
            title: "Success".to_string(),
            description: description.to_string(),
            variant: ToastVariant::Default,
        }
    }

    pub fn error(description: &str) -> Self {
        Self {
            title: "Error".to_string(),
            description: description.to_string(),
            variant: ToastVariant::Destructive,
        }
    }
}

impl fmt::Display for Toast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.variant {
            ToastVariant::Default => "✔",
            ToastVariant::Destructive => "✖",
        };
        write!(f, "{} {}: {}", marker, self.title, self.description)
    }
}
