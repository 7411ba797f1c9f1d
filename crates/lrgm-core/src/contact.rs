//! Contacts: the people every campaign and activity refers to.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

// ─── Category ────────────────────────────────────────────────────────────────

/// How a contact relates to the business.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum ContactCategory {
  Client,
  Partner,
  /// Assumed when a source carries no category.
  #[default]
  Prospect,
}

// ─── Contact ─────────────────────────────────────────────────────────────────

/// Import reads an empty optional cell as `None`, so optional text never
/// survives an export and re-import as `Some("")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
  pub id:         String,
  pub category:   ContactCategory,
  pub first_name: String,
  pub last_name:  String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub org:        Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub phone:      Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub notes:      Option<String>,
}

impl Contact {
  /// "First Last", as shown in lists and timelines.
  pub fn display_name(&self) -> String {
    format!("{} {}", self.first_name, self.last_name)
      .trim()
      .to_owned()
  }

  /// Merge the fields set in `patch` into this contact.
  pub fn apply(&mut self, patch: &ContactPatch) {
    if let Some(category) = patch.category {
      self.category = category;
    }
    if let Some(first_name) = &patch.first_name {
      self.first_name.clone_from(first_name);
    }
    if let Some(last_name) = &patch.last_name {
      self.last_name.clone_from(last_name);
    }
    if let Some(org) = &patch.org {
      self.org.clone_from(org);
    }
    if let Some(email) = &patch.email {
      self.email.clone_from(email);
    }
    if let Some(phone) = &patch.phone {
      self.phone.clone_from(phone);
    }
    if let Some(notes) = &patch.notes {
      self.notes.clone_from(notes);
    }
  }
}

// ─── NewContact ──────────────────────────────────────────────────────────────

/// Input to [`crate::store::LrgmStore::add_contact`]. The id is always
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewContact {
  pub category:   ContactCategory,
  pub first_name: String,
  pub last_name:  String,
  pub org:        Option<String>,
  pub email:      Option<String>,
  pub phone:      Option<String>,
  pub notes:      Option<String>,
}

impl NewContact {
  /// Convenience constructor with all optional fields unset.
  pub fn new(
    category: ContactCategory,
    first_name: impl Into<String>,
    last_name: impl Into<String>,
  ) -> Self {
    Self {
      category,
      first_name: first_name.into(),
      last_name: last_name.into(),
      org: None,
      email: None,
      phone: None,
      notes: None,
    }
  }

  pub fn with_id(self, id: String) -> Contact {
    Contact {
      id,
      category: self.category,
      first_name: self.first_name,
      last_name: self.last_name,
      org: self.org,
      email: self.email,
      phone: self.phone,
      notes: self.notes,
    }
  }
}

// ─── ContactPatch ────────────────────────────────────────────────────────────

/// A partial update. `None` leaves a field untouched; for optional fields,
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactPatch {
  pub category:   Option<ContactCategory>,
  pub first_name: Option<String>,
  pub last_name:  Option<String>,
  pub org:        Option<Option<String>>,
  pub email:      Option<Option<String>>,
  pub phone:      Option<Option<String>>,
  pub notes:      Option<Option<String>>,
}

impl ContactPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }
}

#[cfg(test)]
mod tests {
  use std::str::FromStr;

  use super::*;

  #[test]
  fn category_parses_case_insensitively() {
    assert_eq!(
      ContactCategory::from_str("prospect").unwrap(),
      ContactCategory::Prospect
    );
    assert_eq!(ContactCategory::Client.as_ref(), "CLIENT");
    assert!(ContactCategory::from_str("VENDOR").is_err());
  }

  #[test]
  fn json_uses_camel_case_and_omits_absent_fields() {
    let contact =
      NewContact::new(ContactCategory::Partner, "Jane", "Doe").with_id("a1".into());
    let json = serde_json::to_value(&contact).unwrap();
    assert_eq!(
      json,
      serde_json::json!({
        "id": "a1",
        "category": "PARTNER",
        "firstName": "Jane",
        "lastName": "Doe",
      })
    );
  }

  #[test]
  fn patch_clears_optional_field() {
    let mut contact = NewContact {
      phone: Some("555".into()),
      ..NewContact::new(ContactCategory::Client, "Jane", "Doe")
    }
    .with_id("a1".into());

    contact.apply(&ContactPatch { phone: Some(None), ..Default::default() });

    assert_eq!(contact.phone, None);
    assert_eq!(contact.first_name, "Jane");
  }
}
