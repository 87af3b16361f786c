//! The central subtyping predicate.
//!
//! `is_subtype(sub, sup)` answers "can a value of `sub` flow where `sup` is
//! expected". Reflexivity is identity on the descriptor id; `Any` is the
//! top, `Never` the bottom. Generic applications unwrap on the left;
//! generic parameters resolve through the environment on the left and bind
//! into it on the right. Interfaces on the right are checked structurally,
//! member by member.
//!
//! Functor parameters are checked covariantly and application arguments in
//! the same (left-to-right) direction; both choices are recorded in
//! DESIGN.md.

use crate::checker::Checker;
use crate::env::GenericBinding;
use crate::types::{TypeId, TypeKind};

impl Checker<'_> {
    /// Returns true if `sub` is a subtype of `sup`.
    ///
    /// May write generic resolutions into the active environment; callers
    /// scope those writes by pushing a scope around a call or application
    /// check.
    pub fn is_subtype(&mut self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        if sup == self.builtins.never {
            return false;
        }
        if sup == self.builtins.any {
            return true;
        }

        // Left-side unwrapping comes before the right-side dispatch.
        match self.arena.get(sub) {
            TypeKind::Application(app) => {
                let target = app.target;
                if self.is_subtype(target, sup) {
                    return true;
                }
            }
            TypeKind::Parameter(_) => {
                if let Some(resolved) = self.env.find_generic_resolution(sub) {
                    return self.is_subtype(resolved, sup);
                }
            }
            _ => {}
        }

        match self.arena.get(sup).clone() {
            TypeKind::Simple(_) => {
                let Some(parent) = self.arena.as_simple(sub).and_then(|simple| simple.super_type)
                else {
                    return false;
                };

                self.is_subtype(parent, sup)
            }
            TypeKind::Functor(sup_functor) => {
                let Some(sub_functor) = self.arena.as_functor(sub).cloned() else {
                    return false;
                };
                if sup_functor.params.len() != sub_functor.params.len() {
                    return false;
                }

                for (&sub_param, &sup_param) in
                    sub_functor.params.iter().zip(&sup_functor.params)
                {
                    if !self.is_subtype(sub_param, sup_param) {
                        return false;
                    }
                }

                let sub_ret = sub_functor.return_type.unwrap_or(self.builtins.nil);
                let sup_ret = sup_functor.return_type.unwrap_or(self.builtins.nil);

                self.is_subtype(sub_ret, sup_ret)
            }
            TypeKind::Application(sup_app) => {
                // An interface target binds its formals to the arguments,
                // then the left side is checked structurally against it.
                if let TypeKind::Interface(interface) = self.arena.get(sup_app.target) {
                    let formals = interface.generics.clone();
                    if sup_app.args.len() != formals.len() {
                        self.error_bare("Type argument count mismatch in generic");
                        return false;
                    }
                    for (&formal, &arg) in formals.iter().zip(&sup_app.args) {
                        self.env.bind_generic(formal, arg);
                    }

                    return self.is_subtype(sub, sup_app.target);
                }

                let TypeKind::Application(sub_app) = self.arena.get(sub).clone() else {
                    return false;
                };
                if sub_app.args.len() != sup_app.args.len() {
                    return false;
                }

                for (&sub_arg, &sup_arg) in sub_app.args.iter().zip(&sup_app.args) {
                    if !self.is_subtype(sub_arg, sup_arg) {
                        return false;
                    }
                }

                self.is_subtype(sub_app.target, sup_app.target)
            }
            TypeKind::Parameter(parameter) => {
                let bound_ok = match parameter.bound {
                    None => true,
                    Some(bound) => self.is_subtype(sub, bound),
                };
                if !bound_ok {
                    return false;
                }

                match self.env.resolve_or_bind(sup, sub) {
                    GenericBinding::Bound => true,
                    GenericBinding::Existing(existing) => self.is_subtype(sub, existing),
                    GenericBinding::Absent => false,
                }
            }
            TypeKind::Union(union) => {
                self.is_subtype(sub, union.left) || self.is_subtype(sub, union.right)
            }
            TypeKind::Interface(sup_interface) => {
                let (sub_fields, sub_methods) = match self.arena.get(sub) {
                    TypeKind::Simple(simple) => (simple.fields.clone(), simple.methods.clone()),
                    TypeKind::Interface(interface) => {
                        (interface.fields.clone(), interface.methods.clone())
                    }
                    _ => return false,
                };

                for (name, &field_ty) in &sup_interface.fields {
                    let Some(&sub_ty) = sub_fields.get(name) else {
                        return false;
                    };
                    if !self.is_subtype(sub_ty, field_ty) {
                        return false;
                    }
                }
                for (name, &method_ty) in &sup_interface.methods {
                    let Some(&sub_ty) = sub_methods.get(name) else {
                        return false;
                    };
                    if !self.is_subtype(sub_ty, method_ty) {
                        return false;
                    }
                }

                true
            }
        }
    }
}
