// src/sema/function_analyzer.rs
//! Function-level analysis, as far as the composite-type analyzer needs it:
//! signature elaboration. Body analysis belongs to the expression pass and
//! is triggered only during completion.

use crate::identity::FunctionDefId;
use crate::sema::passes::{AnalysisTask, FnPassSet};
use crate::sema::resolve::TypeResolver;
use crate::sema::Compilation;

pub struct FunctionAnalyzer<'a> {
    comp: &'a mut Compilation,
    target: FunctionDefId,
}

impl<'a> FunctionAnalyzer<'a> {
    pub fn new(comp: &'a mut Compilation, target: FunctionDefId) -> Self {
        Self { comp, target }
    }

    pub fn analyze(&mut self, task: AnalysisTask) -> bool {
        if !self.resolve_signature() {
            return false;
        }
        if task == AnalysisTask::PrepCodeGeneration {
            let func = self.comp.registry.function_mut(self.target);
            if !func.passes.contains(FnPassSet::CONTROL_FLOW) {
                // Statement bodies are elaborated by the expression pass;
                // this layer only records that the stage was reached.
                tracing::trace!(
                    function = %func.qualified_name,
                    "deferring body analysis to the expression pass"
                );
                func.passes.insert(FnPassSet::CONTROL_FLOW);
            }
        }
        true
    }

    fn resolve_signature(&mut self) -> bool {
        let func = self.comp.registry.function(self.target);
        if func.passes.contains(FnPassSet::signature()) {
            return true;
        }

        let scope = Some(func.defined_in);
        let fn_params: Vec<_> = func.type_params.iter().copied().collect();
        let param_asts: Vec<_> = func.params.iter().map(|p| p.ty_ast.clone()).collect();
        let return_ast = func.return_type_ast.clone();

        let mut ok = true;
        let mut param_types = Vec::with_capacity(param_asts.len());
        for ast in &param_asts {
            match ast {
                Some(expr) => {
                    let ty = TypeResolver::new(self.comp, scope)
                        .with_params(&fn_params)
                        .type_from_ast(expr);
                    ok &= !ty.is_invalid();
                    param_types.push(Some(ty));
                }
                None => param_types.push(None),
            }
        }

        let return_type = match &return_ast {
            Some(expr) => {
                let ty = TypeResolver::new(self.comp, scope)
                    .with_params(&fn_params)
                    .type_from_ast(expr);
                ok &= !ty.is_invalid();
                Some(ty)
            }
            // An omitted return type means void.
            None => Some(crate::sema::types::Type::Void),
        };

        let func = self.comp.registry.function_mut(self.target);
        for (param, ty) in func.params.iter_mut().zip(param_types) {
            if param.ty.is_none() {
                param.ty = ty;
            }
        }
        if func.return_type.is_none() {
            func.return_type = return_type;
        }
        func.passes.insert(FnPassSet::signature());

        if !ok {
            tracing::debug!(
                function = %func.qualified_name,
                "signature elaboration failed"
            );
        }
        ok
    }
}
