//! Per-company configuration: the category-to-account-code mapping loaded
//! once per report run from the configuration store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tax filing types the reconciliation tracks. The set is fixed; each maps
/// to a TB code in the company record.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum FormType {
    Pnd1,
    Pnd3,
    Pnd53,
    Pp30,
    Sso,
}

impl FormType {
    pub const ALL: [FormType; 5] = [
        FormType::Pnd1,
        FormType::Pnd3,
        FormType::Pnd53,
        FormType::Pp30,
        FormType::Sso,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FormType::Pnd1 => "PND1",
            FormType::Pnd3 => "PND3",
            FormType::Pnd53 => "PND53",
            FormType::Pp30 => "PP30",
            FormType::Sso => "SSO",
        }
    }

    /// Subfolder name fragment under the withholding-tax parent folder.
    /// PP30 filings live in their own top-level folder instead.
    pub fn subfolder_fragment(&self) -> &'static str {
        self.label()
    }
}

/// Which side of the books an account code feeds, decided by its leading
/// digit: `1`/`2`/`3` are balance-sheet accounts, `4`/`5` are P&L.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountSide {
    BalanceSheet,
    ProfitAndLoss,
    Unknown,
}

pub fn leading_digit(code: &str) -> Option<char> {
    code.trim().chars().next().filter(|c| c.is_ascii_digit())
}

pub fn account_side(code: &str) -> AccountSide {
    match leading_digit(code) {
        Some('1') | Some('2') | Some('3') => AccountSide::BalanceSheet,
        Some('4') | Some('5') => AccountSide::ProfitAndLoss,
        _ => AccountSide::Unknown,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankAccount {
    pub name: String,
    pub tb_code: String,
}

/// A reconcilable category together with its configured account code.
/// Classification happens once, here, instead of re-testing name substrings
/// at every consumption site.
#[derive(Debug, Clone, PartialEq)]
pub enum Category {
    Bank { name: String, tb_code: String },
    Form { form: FormType, tb_code: String },
}

impl Category {
    pub fn display_name(&self) -> &str {
        match self {
            Category::Bank { name, .. } => name,
            Category::Form { form, .. } => form.label(),
        }
    }

    pub fn tb_code(&self) -> &str {
        match self {
            Category::Bank { tb_code, .. } => tb_code,
            Category::Form { tb_code, .. } => tb_code,
        }
    }
}

/// Company record read from the configuration store. Immutable for the
/// duration of a report run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompanyConfig {
    pub name: String,
    #[serde(default)]
    pub banks: Vec<BankAccount>,
    /// Tax-form type to TB code. Empty strings mean "not configured".
    #[serde(default)]
    pub forms: BTreeMap<FormType, String>,
    /// Revenue account codes in configured order ("Revenue", "Revenue2").
    #[serde(default)]
    pub revenue_codes: Vec<String>,
    #[serde(default)]
    pub credit_note_code: Option<String>,
}

impl CompanyConfig {
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// TB code for a form, with blank entries normalized away.
    pub fn form_code(&self, form: FormType) -> Option<&str> {
        self.forms
            .get(&form)
            .map(String::as_str)
            .filter(|code| !code.trim().is_empty())
    }

    /// Revenue codes that are actually configured.
    pub fn configured_revenue_codes(&self) -> Vec<&str> {
        self.revenue_codes
            .iter()
            .map(String::as_str)
            .filter(|code| !code.trim().is_empty())
            .collect()
    }

    pub fn configured_credit_note_code(&self) -> Option<&str> {
        self.credit_note_code
            .as_deref()
            .filter(|code| !code.trim().is_empty())
    }

    /// All comparison-sheet categories in render order: banks first (sorted
    /// by name, as the store returns them), then the fixed forms.
    pub fn categories(&self) -> Vec<Category> {
        let mut out: Vec<Category> = self
            .banks
            .iter()
            .map(|b| Category::Bank {
                name: b.name.clone(),
                tb_code: b.tb_code.clone(),
            })
            .collect();

        for form in FormType::ALL {
            out.push(Category::Form {
                form,
                tb_code: self.form_code(form).unwrap_or_default().to_string(),
            });
        }
        out
    }
}
