use riskdesk_scoring::RiskCategory;
use serde::Serialize;

/// One recommended action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MitigationAction {
    /// Short label.
    pub title: &'static str,
    /// What to do.
    pub detail: &'static str,
}

/// Standard response to a category of risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MitigationPlaybook {
    /// Category covered, `None` for the generic playbook.
    pub category: Option<RiskCategory>,
    /// Ordered actions.
    pub actions: &'static [MitigationAction],
    /// Immediate step.
    pub immediate: &'static str,
    /// Follow-up within weeks.
    pub short_term: &'static str,
    /// Continuing practice.
    pub ongoing: &'static str,
    /// How success is measured.
    pub success_metrics: &'static [&'static str],
}

const fn action(title: &'static str, detail: &'static str) -> MitigationAction {
    MitigationAction { title, detail }
}

const SCHEDULE: MitigationPlaybook = MitigationPlaybook {
    category: Some(RiskCategory::Schedule),
    actions: &[
        action("Buffer Management", "Add buffer periods to critical path activities"),
        action("Resource Optimization", "Allocate additional resources to high-risk activities"),
        action("Dependency Review", "Re-evaluate and restructure task dependencies"),
        action("Milestone Tracking", "Hold more frequent milestone reviews"),
        action("Scope Control", "Defer non-essential scope elements"),
    ],
    immediate: "Review the critical path and identify schedule compression opportunities",
    short_term: "Allocate additional resources to at-risk activities",
    ongoing: "Weekly schedule risk assessment and adjustment",
    success_metrics: &[
        "Schedule Performance Index (SPI) above 0.95",
        "Critical milestones met within 3 business days of baseline",
        "No further schedule deterioration in monthly assessments",
    ],
};

const BUDGET: MitigationPlaybook = MitigationPlaybook {
    category: Some(RiskCategory::Budget),
    actions: &[
        action("Cost Control", "Enhance cost tracking and approval processes"),
        action("Vendor Management", "Renegotiate terms with key suppliers"),
        action("Scope Management", "Review requirements for descoping opportunities"),
        action("Resource Optimization", "Evaluate utilization and adjust allocation"),
        action("Contingency Planning", "Review and, if needed, increase contingency reserves"),
    ],
    immediate: "Run a cost variance analysis and identify savings",
    short_term: "Apply revised approval processes to all expenditure",
    ongoing: "Bi-weekly budget reviews with stakeholders",
    success_metrics: &[
        "Cost Performance Index (CPI) above 0.95",
        "Monthly expenditure within 5% of revised budget",
        "Savings of at least 10% identified in non-critical areas",
    ],
};

const TECHNICAL: MitigationPlaybook = MitigationPlaybook {
    category: Some(RiskCategory::Technical),
    actions: &[
        action("Integration Testing", "Add integration test cycles for high-risk interfaces"),
        action("Expert Review", "Bring specialists in for architecture and code review"),
        action("Knowledge Sharing", "Cross-train team members on critical components"),
        action("Debt Reduction", "Reserve capacity each iteration for technical debt"),
        action("Prototyping", "Spike unproven technology before committing to it"),
    ],
    immediate: "Identify the components carrying the highest technical exposure",
    short_term: "Schedule integration tests and expert reviews for those components",
    ongoing: "Track defect and rework rates per iteration",
    success_metrics: &[
        "Integration defects trending down for three consecutive iterations",
        "No single-person knowledge dependency on critical components",
        "Technical risk score reduced below 7.0",
    ],
};

const MARKET: MitigationPlaybook = MitigationPlaybook {
    category: Some(RiskCategory::Market),
    actions: &[
        action("Market Monitoring", "Track competitor releases and regulatory notices"),
        action("Regulatory Engagement", "Consult compliance early on pending regulation"),
        action("Differentiation", "Re-validate the value proposition with customers"),
        action("Flexible Roadmap", "Keep scope adjustable to absorb demand shifts"),
        action("Scenario Planning", "Prepare responses for adverse market scenarios"),
    ],
    immediate: "Review current market signals with product and compliance owners",
    short_term: "Adjust roadmap priorities against the highest market factors",
    ongoing: "Monthly market signal review",
    success_metrics: &[
        "No unplanned rework caused by regulation",
        "Launch timing holds against competitor releases",
        "Market risk score stable or decreasing",
    ],
};

const GENERIC: MitigationPlaybook = MitigationPlaybook {
    category: None,
    actions: &[
        action("Risk Assessment", "Analyse the risk factor in detail"),
        action("Stakeholder Engagement", "Develop the mitigation plan with relevant stakeholders"),
        action("Monitoring Plan", "Define clear metrics for tracking the risk"),
        action("Contingency Planning", "Prepare plans for worst-case scenarios"),
        action("Regular Review", "Review risk status and mitigation effectiveness periodically"),
    ],
    immediate: "Assign a risk owner and begin the detailed assessment",
    short_term: "Develop and begin implementing the mitigation plan",
    ongoing: "Regular monitoring and adjustment of mitigation strategies",
    success_metrics: &[
        "Risk score reduced by at least 20% within one month",
        "No major impact to project objectives from this risk",
        "Stakeholder confidence in the risk management approach",
    ],
};

impl MitigationPlaybook {
    /// Playbook for `category`, or the generic one.
    #[must_use]
    pub const fn for_category(category: Option<RiskCategory>) -> &'static Self {
        match category {
            Some(RiskCategory::Schedule) => &SCHEDULE,
            Some(RiskCategory::Budget) => &BUDGET,
            Some(RiskCategory::Technical) => &TECHNICAL,
            Some(RiskCategory::Market) => &MARKET,
            None => &GENERIC,
        }
    }

    /// Heading used when rendering.
    #[must_use]
    pub fn title(&self) -> String {
        self.category.map_or_else(
            || "Mitigation Strategy".to_string(),
            |category| format!("Mitigation Strategy for {} Risk", category.label()),
        )
    }

    /// Numbered action lines, e.g. `1. **Cost Control**: ...`.
    #[must_use]
    pub fn action_lines(&self) -> Vec<String> {
        self.actions
            .iter()
            .enumerate()
            .map(|(idx, action)| format!("{}. **{}**: {}", idx + 1, action.title, action.detail))
            .collect()
    }

    /// Markdown rendering with headings at `level` (1 = `#`).
    #[must_use]
    pub fn render_markdown(&self, level: usize) -> String {
        let top = "#".repeat(level.max(1));
        let sub = "#".repeat(level.max(1) + 1);
        let metrics: Vec<String> = self
            .success_metrics
            .iter()
            .map(|metric| format!("- {metric}"))
            .collect();
        format!(
            "{top} {title}\n\n{sub} Recommended Actions\n\n{actions}\n\n{sub} Implementation Timeline\n\n\
             - **Immediate**: {immediate}\n- **Short-term**: {short_term}\n- **Ongoing**: {ongoing}\n\n\
             {sub} Success Metrics\n\n{metrics}\n",
            title = self.title(),
            actions = self.action_lines().join("\n"),
            immediate = self.immediate,
            short_term = self.short_term,
            ongoing = self.ongoing,
            metrics = metrics.join("\n"),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_category_has_a_specific_playbook() {
        for category in RiskCategory::ALL {
            let playbook = MitigationPlaybook::for_category(Some(category));
            assert_eq!(playbook.category, Some(category));
            assert_eq!(playbook.actions.len(), 5);
        }
        assert_eq!(MitigationPlaybook::for_category(None).category, None);
    }

    #[test]
    fn renders_budget_playbook() {
        let markdown =
            MitigationPlaybook::for_category(Some(RiskCategory::Budget)).render_markdown(1);
        assert!(markdown.starts_with("# Mitigation Strategy for Budget Risk\n"));
        assert!(markdown.contains("## Recommended Actions"));
        assert!(markdown.contains("1. **Cost Control**"));
        assert!(markdown.contains("- **Ongoing**: Bi-weekly budget reviews with stakeholders"));
        assert!(markdown.contains("- Cost Performance Index (CPI) above 0.95"));
        assert!(markdown.contains("\n\n## Implementation Timeline\n\n- **Immediate**: "));
        assert!(markdown.ends_with("\n") && !markdown.ends_with("\n\n"));
    }

    #[test]
    fn nested_rendering_shifts_headings() {
        let markdown = MitigationPlaybook::for_category(None).render_markdown(3);
        assert!(markdown.starts_with("### Mitigation Strategy\n"));
        assert!(markdown.contains("#### Success Metrics"));
    }
}
