use super::value::ValueKind;
use std::fmt;

/// A closed set of parameter fields belonging to one scope.
///
/// Implementors are plain enums. The string key of each variant is the name used in state
/// files and at the string-keyed API boundary.
pub trait ParameterField: Copy + Ord + fmt::Debug + 'static {
    /// Every field of the scope, in declaration order.
    const ALL: &'static [Self];

    fn key(self) -> &'static str;

    fn kind(self) -> ValueKind;

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|field| field.key() == key)
    }
}

/// Run-wide parameters shared by every restraint of an ensemble member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeneralField {
    A,
    EndTime,
    EnsembleNum,
    Iteration,
    NumSamples,
    Phase,
    ProductionTime,
    SamplePeriod,
    StartTime,
    Tau,
    Tolerance,
}

impl ParameterField for GeneralField {
    const ALL: &'static [Self] = &[
        GeneralField::A,
        GeneralField::EndTime,
        GeneralField::EnsembleNum,
        GeneralField::Iteration,
        GeneralField::NumSamples,
        GeneralField::Phase,
        GeneralField::ProductionTime,
        GeneralField::SamplePeriod,
        GeneralField::StartTime,
        GeneralField::Tau,
        GeneralField::Tolerance,
    ];

    fn key(self) -> &'static str {
        match self {
            GeneralField::A => "A",
            GeneralField::EndTime => "end_time",
            GeneralField::EnsembleNum => "ensemble_num",
            GeneralField::Iteration => "iteration",
            GeneralField::NumSamples => "num_samples",
            GeneralField::Phase => "phase",
            GeneralField::ProductionTime => "production_time",
            GeneralField::SamplePeriod => "sample_period",
            GeneralField::StartTime => "start_time",
            GeneralField::Tau => "tau",
            GeneralField::Tolerance => "tolerance",
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            GeneralField::EnsembleNum | GeneralField::Iteration | GeneralField::NumSamples => {
                ValueKind::Integer
            }
            GeneralField::Phase => ValueKind::Text,
            _ => ValueKind::Number,
        }
    }
}

/// Parameters unique to one restraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PairField {
    Sites,
    LoggingFilename,
    Alpha,
    Target,
}

impl ParameterField for PairField {
    const ALL: &'static [Self] = &[
        PairField::Sites,
        PairField::LoggingFilename,
        PairField::Alpha,
        PairField::Target,
    ];

    fn key(self) -> &'static str {
        match self {
            PairField::Sites => "sites",
            PairField::LoggingFilename => "logging_filename",
            PairField::Alpha => "alpha",
            PairField::Target => "target",
        }
    }

    fn kind(self) -> ValueKind {
        match self {
            PairField::Sites => ValueKind::Sequence,
            PairField::LoggingFilename => ValueKind::Text,
            PairField::Alpha | PairField::Target => ValueKind::Number,
        }
    }
}
