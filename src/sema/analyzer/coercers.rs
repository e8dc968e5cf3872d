// src/sema/analyzer/coercers.rs
//! Collection of `coerce` conversion functions. These are static,
//! single-parameter functions with a non-void result, consulted later when
//! ranking implicit conversions. They are not inherited.

use crate::frontend::ast::StorageClass;
use crate::sema::analyzer::ClassAnalyzer;
use crate::sema::composite::CompositeKind;
use crate::sema::defs::{DefnRef, Traits};
use crate::sema::function_analyzer::FunctionAnalyzer;
use crate::sema::passes::{AnalysisTask, Pass};
use crate::sema::types::Type;

impl ClassAnalyzer<'_> {
    pub(super) fn analyze_coercers(&mut self) -> bool {
        if !self.composite_mut().passes.begin(Pass::Converter) {
            return true;
        }

        if matches!(self.kind(), CompositeKind::Class | CompositeKind::Struct) {
            let candidates = self.composite().members.get(self.comp.names.coerce).to_vec();
            for member in candidates {
                let DefnRef::Function(func_id) = member else {
                    continue;
                };

                if !FunctionAnalyzer::new(self.comp, func_id)
                    .analyze(AnalysisTask::PrepTypeComparison)
                {
                    continue;
                }

                let func = self.comp.registry.function(func_id);
                let returns_value =
                    matches!(&func.return_type, Some(ty) if !matches!(ty, Type::Void));
                if returns_value
                    && func.storage == StorageClass::Static
                    && func.params.len() == 1
                {
                    if !func.has_unbound_type_params() && self.defn().is_singular() {
                        self.comp.registry.function_mut(func_id).traits |= Traits::SINGULAR;
                    }
                    self.composite_mut().coercers.push(func_id);
                }
            }
        }

        self.composite_mut().passes.finish(Pass::Converter);
        true
    }
}
