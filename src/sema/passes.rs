// src/sema/passes.rs
//! The analysis pass machinery.
//!
//! Each composite type carries a [`PassRegistry`]: two disjoint bitsets over
//! the pass enumeration recording which passes are running and which have
//! finished. Tasks are closed pass sets requested by external callers; the
//! pass runner subtracts the finished set in one bit operation and visits
//! only the remainder.

use bitflags::bitflags;

/// One elementary analysis stage over a composite type, in topological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    ScopeCreation,
    BaseTypes,
    Attribute,
    NamingConflict,
    Converter,
    Constructor,
    MemberType,
    Field,
    FieldType,
    Method,
    Overloading,
    Completion,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PassSet: u16 {
        const SCOPE_CREATION  = 1 << 0;
        const BASE_TYPES      = 1 << 1;
        const ATTRIBUTE       = 1 << 2;
        const NAMING_CONFLICT = 1 << 3;
        const CONVERTER       = 1 << 4;
        const CONSTRUCTOR     = 1 << 5;
        const MEMBER_TYPE     = 1 << 6;
        const FIELD           = 1 << 7;
        const FIELD_TYPE      = 1 << 8;
        const METHOD          = 1 << 9;
        const OVERLOADING     = 1 << 10;
        const COMPLETION      = 1 << 11;
    }
}

impl Pass {
    pub fn bit(self) -> PassSet {
        match self {
            Pass::ScopeCreation => PassSet::SCOPE_CREATION,
            Pass::BaseTypes => PassSet::BASE_TYPES,
            Pass::Attribute => PassSet::ATTRIBUTE,
            Pass::NamingConflict => PassSet::NAMING_CONFLICT,
            Pass::Converter => PassSet::CONVERTER,
            Pass::Constructor => PassSet::CONSTRUCTOR,
            Pass::MemberType => PassSet::MEMBER_TYPE,
            Pass::Field => PassSet::FIELD,
            Pass::FieldType => PassSet::FIELD_TYPE,
            Pass::Method => PassSet::METHOD,
            Pass::Overloading => PassSet::OVERLOADING,
            Pass::Completion => PassSet::COMPLETION,
        }
    }
}

/// A named closed set of passes requested by an external caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisTask {
    PrepTypeComparison,
    PrepMemberLookup,
    PrepConstruction,
    PrepConversion,
    PrepEvaluation,
    PrepTypeGeneration,
    PrepCodeGeneration,
}

impl AnalysisTask {
    pub fn passes(self) -> PassSet {
        match self {
            AnalysisTask::PrepTypeComparison => PassSet::SCOPE_CREATION | PassSet::BASE_TYPES,
            AnalysisTask::PrepMemberLookup => {
                AnalysisTask::PrepTypeComparison.passes() | PassSet::ATTRIBUTE
            }
            AnalysisTask::PrepConstruction => {
                AnalysisTask::PrepMemberLookup.passes()
                    | PassSet::NAMING_CONFLICT
                    | PassSet::CONSTRUCTOR
            }
            AnalysisTask::PrepConversion => {
                AnalysisTask::PrepMemberLookup.passes()
                    | PassSet::NAMING_CONFLICT
                    | PassSet::CONVERTER
            }
            AnalysisTask::PrepEvaluation => {
                AnalysisTask::PrepConversion.passes()
                    | PassSet::MEMBER_TYPE
                    | PassSet::FIELD
                    | PassSet::METHOD
                    | PassSet::OVERLOADING
            }
            AnalysisTask::PrepTypeGeneration => {
                AnalysisTask::PrepMemberLookup.passes()
                    | PassSet::NAMING_CONFLICT
                    | PassSet::FIELD
                    | PassSet::FIELD_TYPE
            }
            AnalysisTask::PrepCodeGeneration => PassSet::all(),
        }
    }
}

/// Per-type record of running and finished passes.
///
/// The two sets are disjoint at all times: a pass is either not yet started,
/// running, or finished. The `running` bit doubles as the cycle detector for
/// recursive analysis across the type graph.
#[derive(Debug, Clone, Default)]
pub struct PassRegistry {
    running: PassSet,
    finished: PassSet,
}

impl PassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try to start a pass. Returns false if the pass already finished or is
    /// currently running; callers that need to distinguish re-entry check
    /// [`is_running`](Self::is_running) first.
    pub fn begin(&mut self, pass: Pass) -> bool {
        let bit = pass.bit();
        if self.finished.contains(bit) || self.running.contains(bit) {
            return false;
        }
        self.running.insert(bit);
        true
    }

    pub fn finish(&mut self, pass: Pass) {
        let bit = pass.bit();
        debug_assert!(self.running.contains(bit), "finish() without begin()");
        self.running.remove(bit);
        self.finished.insert(bit);
    }

    pub fn is_running(&self, pass: Pass) -> bool {
        self.running.contains(pass.bit())
    }

    pub fn is_finished(&self, pass: Pass) -> bool {
        self.finished.contains(pass.bit())
    }

    pub fn finished(&self) -> PassSet {
        self.finished
    }
}

bitflags! {
    /// Function-level analysis stages, tracked on each function definition.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct FnPassSet: u8 {
        const ATTRIBUTE      = 1 << 0;
        const PARAMETER_TYPE = 1 << 1;
        const RETURN_TYPE    = 1 << 2;
        const CONTROL_FLOW   = 1 << 3;
    }
}

impl FnPassSet {
    /// The stages a synthesized function is born with, so that later
    /// function analysis is skipped entirely.
    pub fn synthesized() -> Self {
        FnPassSet::all()
    }

    pub fn signature() -> Self {
        FnPassSet::PARAMETER_TYPE | FnPassSet::RETURN_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn begin_marks_running_until_finish() {
        let mut passes = PassRegistry::new();
        assert!(passes.begin(Pass::BaseTypes));
        assert!(passes.is_running(Pass::BaseTypes));
        assert!(!passes.is_finished(Pass::BaseTypes));

        passes.finish(Pass::BaseTypes);
        assert!(!passes.is_running(Pass::BaseTypes));
        assert!(passes.is_finished(Pass::BaseTypes));
    }

    #[test]
    fn begin_rejects_finished_pass() {
        let mut passes = PassRegistry::new();
        assert!(passes.begin(Pass::Field));
        passes.finish(Pass::Field);
        assert!(!passes.begin(Pass::Field));
    }

    #[test]
    fn begin_rejects_running_pass() {
        let mut passes = PassRegistry::new();
        assert!(passes.begin(Pass::BaseTypes));
        assert!(!passes.begin(Pass::BaseTypes));
        assert!(passes.is_running(Pass::BaseTypes));
    }

    #[test]
    fn running_and_finished_stay_disjoint() {
        let mut passes = PassRegistry::new();
        passes.begin(Pass::Method);
        passes.finish(Pass::Method);
        passes.begin(Pass::Overloading);
        assert!(passes.finished().intersection(Pass::Overloading.bit()).is_empty());
        assert!(!passes.is_running(Pass::Method));
    }

    #[test]
    fn tasks_are_supersets_of_earlier_tasks() {
        let comparison = AnalysisTask::PrepTypeComparison.passes();
        let lookup = AnalysisTask::PrepMemberLookup.passes();
        let codegen = AnalysisTask::PrepCodeGeneration.passes();
        assert!(lookup.contains(comparison));
        assert!(codegen.contains(lookup));
        assert!(codegen.contains(AnalysisTask::PrepEvaluation.passes()));
    }

    #[test]
    fn codegen_task_covers_every_pass() {
        let codegen = AnalysisTask::PrepCodeGeneration.passes();
        assert_eq!(codegen, PassSet::all());
    }
}
