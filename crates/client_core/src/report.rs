use shared::domain::HealthParameter;

pub const EMPTY_RESULTS_NOTICE: &str = "No health parameters found.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insight {
    Normal,
    NeedsAttention,
}

impl Insight {
    pub fn label(self) -> &'static str {
        match self {
            Insight::Normal => "Normal",
            Insight::NeedsAttention => "Needs Attention",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultRow {
    pub parameter: String,
    pub value: String,
    pub unit: String,
    pub range: String,
    pub abnormal: bool,
}

impl ResultRow {
    pub fn from_parameter(parameter: &HealthParameter) -> Self {
        Self {
            parameter: parameter.parameter.clone(),
            value: parameter.value.clone(),
            unit: parameter.unit.clone(),
            range: parameter.range.clone(),
            abnormal: parameter.is_abnormal(),
        }
    }

    pub fn insight(&self) -> Insight {
        if self.abnormal {
            Insight::NeedsAttention
        } else {
            Insight::Normal
        }
    }

    /// Text of the per-row detail disclosure.
    pub fn details(&self) -> String {
        format!(
            "{}\nValue: {} {}\nRange: {}\nInsight: {}",
            self.parameter,
            self.value,
            self.unit,
            self.range,
            self.insight().label()
        )
    }
}

/// What the result area shows. An empty result list is distinct from no submission at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultView {
    NoSubmission,
    Empty,
    Rows(Vec<ResultRow>),
}

impl ResultView {
    pub fn from_results(results: Option<&[HealthParameter]>) -> Self {
        match results {
            None => ResultView::NoSubmission,
            Some([]) => ResultView::Empty,
            Some(results) => {
                ResultView::Rows(results.iter().map(ResultRow::from_parameter).collect())
            }
        }
    }

    pub fn rows(&self) -> &[ResultRow] {
        match self {
            ResultView::Rows(rows) => rows,
            ResultView::NoSubmission | ResultView::Empty => &[],
        }
    }

    pub fn abnormal_count(&self) -> usize {
        self.rows().iter().filter(|row| row.abnormal).count()
    }
}
