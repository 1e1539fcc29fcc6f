//! Static reference dataset: trade agreements, preferential rate lines,
//! rules-of-origin text, MFN fallback rates, and the compliance rule table.
//!
//! Loaded once at startup and treated as immutable for the lifetime of the
//! process. Kept behind [`ReferenceData`] accessors so a managed feed can
//! replace the in-source tables without touching calculation logic.
//! Refreshes happen through the out-of-scope ingestion pipeline only.

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::compliance::{ComplianceRule, Severity};
use crate::types::Rate;

/// A named preferential trade regime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeAgreement {
    pub code: String,
    pub name: String,
    pub agreement_type: String,
    /// ISO 3166-1 alpha-2 codes of covered origin countries.
    pub covered_origins: Vec<String>,
    pub active: bool,
    /// Proof-of-origin documents required to claim the preference.
    pub proof_documents: Vec<String>,
    pub sources: Vec<String>,
}

/// One preferential duty line: agreement + HS prefix (6 or 4 digits) ->
/// ad valorem rate as a fraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreferentialRateLine {
    pub agreement_code: String,
    pub hs_prefix: String,
    pub rate: Rate,
}

/// Rules-of-origin text for an (agreement, HS prefix) pair. The prefix is
/// either a full HS code or a 2-digit chapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesOfOriginEntry {
    pub agreement_code: String,
    pub hs_prefix: String,
    pub text: String,
}

/// The full immutable reference dataset.
#[derive(Debug, Clone)]
pub struct ReferenceData {
    agreements: Vec<TradeAgreement>,
    preferential_rates: Vec<PreferentialRateLine>,
    rules_of_origin: Vec<RulesOfOriginEntry>,
    /// Chapter-level MFN fallback, for purely specific base rates.
    mfn_fallback: Vec<(String, Rate)>,
    compliance_rules: Vec<ComplianceRule>,
}

impl ReferenceData {
    /// Active agreements covering the given origin, in declaration order.
    /// Declaration order is the tie-break for equal preferential rates.
    pub fn agreements_covering(&self, origin_iso2: &str) -> Vec<&TradeAgreement> {
        let origin = origin_iso2.to_uppercase();
        self.agreements
            .iter()
            .filter(|a| a.active && a.covered_origins.iter().any(|c| *c == origin))
            .collect()
    }

    pub fn agreements(&self) -> &[TradeAgreement] {
        &self.agreements
    }

    /// Preferential rate for an agreement and HS code: 6-digit match first,
    /// then the 4-digit heading.
    pub fn preferential_rate(&self, agreement_code: &str, hs_code: &str) -> Option<Rate> {
        let hs6 = hs_prefix(hs_code, 6)?;
        let hs4 = hs_prefix(hs_code, 4)?;
        for prefix in [hs6, hs4] {
            if let Some(line) = self
                .preferential_rates
                .iter()
                .find(|l| l.agreement_code == agreement_code && l.hs_prefix == prefix)
            {
                return Some(line.rate);
            }
        }
        None
    }

    /// Rules-of-origin text: exact HS match first, then 6-digit, then the
    /// 2-digit chapter.
    pub fn rules_of_origin(&self, agreement_code: &str, hs_code: &str) -> Option<&str> {
        let hs6 = hs_prefix(hs_code, 6)?;
        let chapter = hs_prefix(hs_code, 2)?;
        for prefix in [hs_code, hs6, chapter] {
            if let Some(entry) = self
                .rules_of_origin
                .iter()
                .find(|e| e.agreement_code == agreement_code && e.hs_prefix == prefix)
            {
                return Some(&entry.text);
            }
        }
        None
    }

    /// Chapter-level MFN fallback rate, for callers that cannot derive an
    /// ad valorem MFN value from the base duty rule.
    pub fn mfn_fallback_rate(&self, hs_code: &str) -> Option<Rate> {
        let chapter = hs_prefix(hs_code, 2)?;
        self.mfn_fallback
            .iter()
            .find(|(c, _)| c == chapter)
            .map(|(_, r)| *r)
    }

    pub fn compliance_rules(&self) -> &[ComplianceRule] {
        &self.compliance_rules
    }

    /// The built-in dataset.
    pub fn builtin() -> Self {
        ReferenceData {
            agreements: builtin_agreements(),
            preferential_rates: builtin_preferential_rates(),
            rules_of_origin: builtin_rules_of_origin(),
            mfn_fallback: builtin_mfn_fallback(),
            compliance_rules: builtin_compliance_rules(),
        }
    }
}

/// A leading slice of an HS code. `None` for codes containing anything
/// other than ASCII digits — nothing else appears in the tariff tables,
/// and byte slicing is only safe once that holds.
fn hs_prefix(hs_code: &str, len: usize) -> Option<&str> {
    if !hs_code.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(&hs_code[..hs_code.len().min(len)])
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn builtin_agreements() -> Vec<TradeAgreement> {
    vec![
        TradeAgreement {
            code: "SADC".into(),
            name: "SADC Free Trade Area".into(),
            agreement_type: "FTA".into(),
            covered_origins: strings(&[
                "AO", "BW", "CD", "KM", "SZ", "LS", "MG", "MW", "MU", "MZ", "NA", "SC", "TZ",
                "ZM", "ZW",
            ]),
            active: true,
            proof_documents: strings(&["SADC Certificate of Origin"]),
            sources: strings(&["SADC Protocol on Trade, Annex I"]),
        },
        TradeAgreement {
            code: "SACU".into(),
            name: "Southern African Customs Union".into(),
            agreement_type: "Customs union".into(),
            covered_origins: strings(&["BW", "LS", "NA", "SZ"]),
            active: true,
            proof_documents: strings(&["SAD 500 with SACU origin declaration"]),
            sources: strings(&["SACU Agreement 2002, Article 18"]),
        },
        TradeAgreement {
            code: "AFCFTA".into(),
            name: "African Continental Free Trade Area".into(),
            agreement_type: "FTA".into(),
            covered_origins: strings(&[
                "EG", "GH", "KE", "NG", "CM", "CI", "DZ", "TN", "RW", "SN", "ET", "UG",
            ]),
            active: true,
            proof_documents: strings(&["AfCFTA Certificate of Origin"]),
            sources: strings(&["AfCFTA Agreement, Annex 2 on Rules of Origin"]),
        },
        TradeAgreement {
            code: "EU-EPA".into(),
            name: "SADC-EU Economic Partnership Agreement".into(),
            agreement_type: "EPA".into(),
            covered_origins: strings(&[
                "AT", "BE", "CZ", "DE", "DK", "ES", "FI", "FR", "IE", "IT", "NL", "PL", "PT",
                "SE",
            ]),
            active: true,
            proof_documents: strings(&[
                "EUR.1 movement certificate",
                "Origin declaration (approved exporter)",
            ]),
            sources: strings(&["SADC-EU EPA, Protocol 1"]),
        },
        TradeAgreement {
            code: "MERCOSUR-PTA".into(),
            name: "SACU-MERCOSUR Preferential Trade Agreement".into(),
            agreement_type: "PTA".into(),
            covered_origins: strings(&["AR", "BR", "PY", "UY"]),
            active: true,
            proof_documents: strings(&["MERCOSUR Certificate of Origin"]),
            sources: strings(&["SACU-MERCOSUR PTA, Annex III"]),
        },
        TradeAgreement {
            code: "EFTA".into(),
            name: "SACU-EFTA Free Trade Agreement".into(),
            agreement_type: "FTA".into(),
            covered_origins: strings(&["CH", "NO", "IS", "LI"]),
            active: true,
            proof_documents: strings(&["EUR.1 movement certificate"]),
            sources: strings(&["SACU-EFTA FTA, Annex V"]),
        },
    ]
}

fn rate_line(agreement: &str, prefix: &str, rate: Rate) -> PreferentialRateLine {
    PreferentialRateLine {
        agreement_code: agreement.into(),
        hs_prefix: prefix.into(),
        rate,
    }
}

fn builtin_preferential_rates() -> Vec<PreferentialRateLine> {
    vec![
        // SADC FTA — zero-rated for qualifying originating goods
        rate_line("SADC", "610910", dec!(0)),
        rate_line("SADC", "640359", dec!(0)),
        rate_line("SADC", "220421", dec!(0)),
        rate_line("SADC", "040610", dec!(0)),
        rate_line("SADC", "8517", dec!(0)),
        // SACU — intra-union movement is duty free
        rate_line("SACU", "610910", dec!(0)),
        rate_line("SACU", "640359", dec!(0)),
        rate_line("SACU", "8517", dec!(0)),
        rate_line("SACU", "2204", dec!(0)),
        // AfCFTA — phase-down rates
        rate_line("AFCFTA", "610910", dec!(0.10)),
        rate_line("AFCFTA", "6403", dec!(0.15)),
        rate_line("AFCFTA", "0406", dec!(0.05)),
        // SADC-EU EPA
        rate_line("EU-EPA", "640359", dec!(0.048)),
        rate_line("EU-EPA", "6109", dec!(0.20)),
        rate_line("EU-EPA", "220421", dec!(0)),
        rate_line("EU-EPA", "8703", dec!(0.18)),
        // SACU-MERCOSUR PTA — narrow margins of preference
        rate_line("MERCOSUR-PTA", "6403", dec!(0.24)),
        // SACU-EFTA
        rate_line("EFTA", "640359", dec!(0.06)),
        rate_line("EFTA", "6109", dec!(0.22)),
        rate_line("EFTA", "0406", dec!(0.04)),
    ]
}

fn roo(agreement: &str, prefix: &str, text: &str) -> RulesOfOriginEntry {
    RulesOfOriginEntry {
        agreement_code: agreement.into(),
        hs_prefix: prefix.into(),
        text: text.into(),
    }
}

fn builtin_rules_of_origin() -> Vec<RulesOfOriginEntry> {
    vec![
        roo(
            "SADC",
            "61",
            "Knitted garments must be manufactured from yarn within the region \
             (double transformation).",
        ),
        roo(
            "SADC",
            "64",
            "Footwear must be assembled in the region from uppers not already \
             fitted to soles.",
        ),
        roo(
            "SADC",
            "22",
            "Wine must be produced wholly from grapes grown in the exporting \
             member state.",
        ),
        roo(
            "SACU",
            "61",
            "Goods in free circulation within the common customs area move duty \
             free; no transformation test applies.",
        ),
        roo(
            "EU-EPA",
            "640359",
            "Manufacture from materials of any heading except assembled uppers \
             of heading 6406.",
        ),
        roo(
            "EU-EPA",
            "61",
            "Manufacture from yarn (double transformation), with tolerances per \
             Protocol 1 Article 5.",
        ),
        roo(
            "EU-EPA",
            "87",
            "Manufacture in which the value of all non-originating materials \
             does not exceed 40% of the ex-works price.",
        ),
        roo(
            "AFCFTA",
            "61",
            "Value-added threshold of 40% or change of tariff heading, per \
             Annex 2 product-specific rules.",
        ),
        roo(
            "EFTA",
            "64",
            "Manufacture from materials of any heading except assembled uppers.",
        ),
    ]
}

fn builtin_mfn_fallback() -> Vec<(String, Rate)> {
    [
        ("04", dec!(0.20)),
        ("22", dec!(0.25)),
        ("61", dec!(0.45)),
        ("62", dec!(0.45)),
        ("63", dec!(0.30)),
        ("64", dec!(0.30)),
        ("85", dec!(0)),
        ("87", dec!(0.25)),
    ]
    .into_iter()
    .map(|(c, r)| (c.to_string(), r))
    .collect()
}

fn builtin_compliance_rules() -> Vec<ComplianceRule> {
    let rule = |id: &str,
                authority: &str,
                rule_type: &str,
                title: &str,
                summary: &str,
                severity: Severity,
                patterns: &[&str],
                used_goods: Option<bool>,
                actions: &[&str],
                documents: &[&str],
                sources: &[&str]| ComplianceRule {
        id: id.into(),
        authority: authority.into(),
        rule_type: rule_type.into(),
        title: title.into(),
        summary: summary.into(),
        severity,
        hs_patterns: strings(patterns),
        used_goods,
        actions: strings(actions),
        documents: strings(documents),
        sources: strings(sources),
    };

    vec![
        rule(
            "itac-used-goods-permit",
            "ITAC",
            "import_permit",
            "Second-hand goods import permit required",
            "All used or second-hand goods require an ITAC import permit issued \
             before shipment date.",
            Severity::High,
            &["*"],
            Some(true),
            &["Apply for an ITAC import permit before the goods are shipped"],
            &["ITAC import permit (form IE 462)"],
            &["International Trade Administration Act 71 of 2002"],
        ),
        rule(
            "itac-used-vehicle-permit",
            "ITAC",
            "import_permit",
            "Used vehicle imports are restricted",
            "Used vehicles may only be imported under narrow exemptions \
             (returning residents, vintage vehicles); permits are rarely granted.",
            Severity::High,
            &["87"],
            Some(true),
            &["Confirm eligibility under an ITAC exemption category before purchase"],
            &["ITAC used vehicle import permit", "Letter of Authority (NRCS)"],
            &["ITAC Guidelines: Importation of Second-hand Vehicles"],
        ),
        rule(
            "nrcs-loa-electronics",
            "NRCS",
            "product_approval",
            "NRCS Letter of Authority required",
            "Electrical and electronic equipment under compulsory specification \
             needs an NRCS Letter of Authority before sale.",
            Severity::Medium,
            &["84", "85"],
            None,
            &["Apply for an NRCS LOA against the applicable compulsory specification"],
            &["NRCS Letter of Authority"],
            &["NRCS VC 8055", "NRCS VC 8077"],
        ),
        rule(
            "icasa-type-approval",
            "ICASA",
            "product_approval",
            "ICASA type approval for radio equipment",
            "Devices with radio transmitters (phones, routers, IoT) require \
             ICASA type approval.",
            Severity::Medium,
            &["8517", "8525", "8526"],
            None,
            &["Obtain ICASA type approval or confirm the device is already approved"],
            &["ICASA type approval certificate"],
            &["Electronic Communications Act 36 of 2005"],
        ),
        rule(
            "sahpra-medicines",
            "SAHPRA",
            "registration",
            "Medicines must be SAHPRA registered",
            "Medicaments require SAHPRA registration and an import permit; \
             unregistered imports are seized.",
            Severity::High,
            &["3003", "3004"],
            None,
            &["Verify SAHPRA registration and obtain a Section 21 authorisation if unregistered"],
            &["SAHPRA registration certificate", "Import permit"],
            &["Medicines and Related Substances Act 101 of 1965"],
        ),
        rule(
            "daff-plant-health",
            "DALRRD",
            "phytosanitary",
            "Phytosanitary import permit required",
            "Plants and plant products require a phytosanitary certificate and \
             an import permit issued before shipment.",
            Severity::Medium,
            &["06", "07", "08", "10", "12"],
            None,
            &["Apply for a plant import permit and arrange inspection on arrival"],
            &["Phytosanitary certificate", "DALRRD import permit"],
            &["Agricultural Pests Act 36 of 1983"],
        ),
        rule(
            "sars-excise-alcohol",
            "SARS",
            "excise",
            "Excise duty and licensing on alcoholic beverages",
            "Alcoholic beverages attract excise duty in addition to customs duty \
             and require a licensed customs and excise warehouse for deferment.",
            Severity::Medium,
            &["2203", "2204", "2205", "2206", "2207", "2208"],
            None,
            &["Account for excise duty on the SAD 500; consider a bonded warehouse"],
            &["DA 260 excise account"],
            &["Customs and Excise Act 91 of 1964, Schedule 1 Part 2A"],
        ),
        rule(
            "sars-textile-reference-pricing",
            "SARS",
            "valuation",
            "Clothing imports face reference-price scrutiny",
            "Apparel declarations below SARS reference prices are routinely \
             stopped for valuation review.",
            Severity::Low,
            &["61", "62", "63"],
            None,
            &["Keep full commercial invoices and proof of payment available"],
            &["Commercial invoice", "Proof of payment"],
            &["SARS customs valuation guidelines"],
        ),
        rule(
            "saps-weapons-control",
            "SAPS",
            "import_permit",
            "Firearms and ammunition are controlled imports",
            "Arms and ammunition require SAPS import authorisation under the \
             Firearms Control Act.",
            Severity::High,
            &["93"],
            None,
            &["Obtain SAPS import authorisation before shipment"],
            &["SAPS import permit"],
            &["Firearms Control Act 60 of 2000"],
        ),
        rule(
            "sars-sugar-levy",
            "SARS",
            "levy",
            "Health promotion levy on sugary beverages",
            "Sugary beverages attract the health promotion levy on top of \
             customs duty and VAT.",
            Severity::Low,
            &["1701", "2202"],
            None,
            &["Declare sugar content; account for the levy on entry"],
            &["DA 179 levy account"],
            &["Rates and Monetary Amounts Act (Health Promotion Levy)"],
        ),
    ]
}
