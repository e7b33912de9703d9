//! Overload resolution with type-parameter binding.

use std::collections::HashMap;
use std::sync::Arc;

use crate::decls::FunctionDecl;
use crate::types::CelType;

type Bindings = HashMap<Arc<str>, CelType>;

/// Result type of calling `func` on `target` and `args`, or `None` if no
/// overload accepts them.
///
/// When several overloads match (possible with `dyn` arguments) and their
/// result types disagree, the call is typed `dyn`.
pub(crate) fn resolve_overload(
    func: &FunctionDecl,
    target: Option<&CelType>,
    args: &[CelType],
) -> Option<CelType> {
    let actual: Vec<&CelType> = target.into_iter().chain(args).collect();
    let mut resolved: Option<CelType> = None;

    for overload in &func.overloads {
        if overload.is_member != target.is_some() || overload.params.len() != actual.len() {
            continue;
        }
        let mut bindings = Bindings::new();
        let matches = overload
            .params
            .iter()
            .zip(&actual)
            .all(|(param, arg)| bind(param, arg, &mut bindings));
        if !matches {
            continue;
        }
        let result = finalize(&substitute(&overload.result, &bindings));
        resolved = Some(match resolved {
            Some(previous) if previous != result => CelType::Dyn,
            _ => result,
        });
    }
    resolved
}

/// Matches `arg` against `param`, binding type parameters as it goes.
fn bind(param: &CelType, arg: &CelType, bindings: &mut Bindings) -> bool {
    match (param, arg) {
        (CelType::TypeParam(name), _) => {
            let bound = match bindings.get(name) {
                Some(bound) => bound.join(arg),
                None => Some(arg.clone()),
            };
            match bound {
                Some(ty) => {
                    bindings.insert(name.clone(), ty);
                    true
                }
                None => false,
            }
        }
        (_, arg) if arg.is_dyn_or_error() => true,
        (CelType::Dyn, _) => true,
        (CelType::List(p), CelType::List(a)) => bind(p, a, bindings),
        (CelType::Map(pk, pv), CelType::Map(ak, av)) => {
            bind(pk, ak, bindings) && bind(pv, av, bindings)
        }
        _ => param == arg,
    }
}

fn substitute(ty: &CelType, bindings: &Bindings) -> CelType {
    match ty {
        CelType::TypeParam(name) => bindings.get(name).cloned().unwrap_or_else(|| ty.clone()),
        CelType::List(elem) => CelType::list(substitute(elem, bindings)),
        CelType::Map(key, value) => {
            CelType::map(substitute(key, bindings), substitute(value, bindings))
        }
        _ => ty.clone(),
    }
}

/// Unbound type parameters become `dyn`.
fn finalize(ty: &CelType) -> CelType {
    match ty {
        CelType::TypeParam(_) => CelType::Dyn,
        CelType::List(elem) => CelType::list(finalize(elem)),
        CelType::Map(key, value) => CelType::map(finalize(key), finalize(value)),
        _ => ty.clone(),
    }
}
