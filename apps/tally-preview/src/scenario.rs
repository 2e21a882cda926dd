//! # Scenarios
//!
//! A scenario file holds the catalogs and one pricing request.
//!
//! ```toml
//! date = "2026-11-11"
//! operation = "selection"          # selection | service | change
//!
//! [[packages]]
//! id = 1
//! name = "Basic"
//! taxable = true
//! prorata_day = 1
//!
//! [[packages.pricing]]
//! id = 10
//! package_id = 1
//! term = 1
//! period = "month"
//! currency = "USD"
//! price = "12.00"
//!
//! [request]
//! package_id = 1
//! pricing_id = 10
//! ```

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use tally_core::{
    Breakdown, Catalogs, Coupon, Package, PackageOption, PackagePricing, PricingPresenter, Selection,
    Service, TaxRule,
};

use crate::error::{PreviewError, PreviewResult};

/// Which presenter operation a scenario runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Price a new package selection.
    #[default]
    Selection,
    /// Price an existing service.
    Service,
    /// Price changing the service to the requested package.
    Change,
}

/// The package a selection asks for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub package_id: Option<u32>,

    #[serde(default)]
    pub pricing_id: Option<u32>,

    #[serde(default, flatten)]
    pub selection: Selection,
}

/// A complete scenario file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub date: NaiveDate,

    #[serde(default)]
    pub operation: Operation,

    #[serde(default)]
    pub packages: Vec<Package>,

    #[serde(default)]
    pub coupons: Vec<Coupon>,

    #[serde(default)]
    pub tax_rules: Vec<TaxRule>,

    #[serde(default)]
    pub options: Vec<PackageOption>,

    #[serde(default)]
    pub service: Option<Service>,

    #[serde(default)]
    pub request: Request,
}

impl Scenario {
    pub fn load(path: &Path) -> PreviewResult<Self> {
        info!(?path, "Loading scenario");
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    pub fn catalogs(&self) -> Catalogs<'_> {
        Catalogs {
            tax_rules: &self.tax_rules,
            coupons: &self.coupons,
            options: &self.options,
        }
    }

    /// Runs the scenario's operation.
    pub fn run(&self, presenter: &PricingPresenter<'_>) -> PreviewResult<Breakdown> {
        match self.operation {
            Operation::Selection => {
                let (package, pricing) = self.requested_package()?;
                Ok(presenter.format_selection(&self.request.selection, package, pricing, self.date))
            }
            Operation::Service => Ok(presenter.format_service(self.service()?, self.date)),
            Operation::Change => {
                let service = self.service()?;
                let (package, pricing) = self.requested_package()?;
                Ok(presenter.format_service_change(
                    service,
                    &self.request.selection,
                    package,
                    pricing,
                    self.date,
                ))
            }
        }
    }

    fn service(&self) -> PreviewResult<&Service> {
        self.service
            .as_ref()
            .ok_or_else(|| PreviewError::Scenario(format!("operation '{:?}' needs a [service]", self.operation)))
    }

    fn requested_package(&self) -> PreviewResult<(&Package, &PackagePricing)> {
        let package_id = self
            .request
            .package_id
            .ok_or_else(|| PreviewError::Scenario("request.package_id is required".into()))?;
        let package = self
            .packages
            .iter()
            .find(|p| p.id == package_id)
            .ok_or_else(|| PreviewError::Scenario(format!("package {package_id} is not defined")))?;

        let pricing = match self.request.pricing_id {
            Some(pricing_id) => package.find_pricing(pricing_id).ok_or_else(|| {
                PreviewError::Scenario(format!("package {package_id} has no pricing {pricing_id}"))
            })?,
            None => package.pricing.first().ok_or_else(|| {
                PreviewError::Scenario(format!("package {package_id} has no pricing"))
            })?,
        };

        Ok((package, pricing))
    }
}
