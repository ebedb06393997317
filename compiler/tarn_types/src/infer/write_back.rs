//! Replace every type slot with its fully substituted type.

use tarn_ir::ir::{IrKind, IrNode, Pattern, PatternKind};
use tarn_stack::ensure_sufficient_stack;

use super::Infer;

impl Infer<'_> {
    pub(super) fn write_expr(&mut self, node: &mut IrNode) {
        ensure_sufficient_stack(|| {
            node.value.ty = self.ctx.resolve(&node.value.ty);
            match &mut node.value.value {
                IrKind::Const(_) | IrKind::Identifier(_) | IrKind::Error => {}
                IrKind::Tuple(items) => {
                    for item in items {
                        self.write_expr(item);
                    }
                }
                IrKind::Record { fields, .. } => {
                    for (_, value) in fields {
                        self.write_expr(value);
                    }
                }
                IrKind::Project { value, .. } => self.write_expr(value),
                IrKind::Function(function) => {
                    for capture in &mut function.captures {
                        capture.ty = self.ctx.resolve(&capture.ty);
                    }
                    if let Some(param) = &mut function.param {
                        if let Some(hint) = &mut param.hint {
                            *hint = self.ctx.resolve(hint);
                        }
                    }
                    self.write_expr(&mut function.body);
                }
                IrKind::Call {
                    callee, argument, ..
                } => {
                    self.write_expr(callee);
                    self.write_expr(argument);
                }
                IrKind::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    self.write_expr(condition);
                    self.write_expr(then_branch);
                    self.write_expr(else_branch);
                }
                IrKind::Match {
                    scrutinee,
                    patterns,
                    branches,
                } => {
                    self.write_expr(scrutinee);
                    for pattern in patterns {
                        self.write_pattern(pattern);
                    }
                    for branch in branches {
                        self.write_expr(branch);
                    }
                }
                IrKind::Let {
                    pattern,
                    value,
                    body,
                } => {
                    self.write_pattern(pattern);
                    self.write_expr(value);
                    self.write_expr(body);
                }
            }
        });
    }

    pub(super) fn write_pattern(&mut self, pattern: &mut Pattern) {
        ensure_sufficient_stack(|| {
            pattern.value.ty = self.ctx.resolve(&pattern.value.ty);
            match &mut pattern.value.value {
                PatternKind::Wildcard
                | PatternKind::Const(_)
                | PatternKind::Binding(_)
                | PatternKind::Error => {}
                PatternKind::Tuple(items) => {
                    for item in items {
                        self.write_pattern(item);
                    }
                }
                PatternKind::Array(array) => {
                    for item in array.elements_mut() {
                        self.write_pattern(item);
                    }
                }
                PatternKind::Constructor { payload, .. } => {
                    if let Some(payload) = payload {
                        self.write_pattern(payload);
                    }
                }
                PatternKind::Hinted { pattern: inner, .. } => self.write_pattern(inner),
            }
        });
    }
}
