use std::fmt::Debug;

use super::node::Node;
use crate::error::InvariantViolation;

/// Checks key ordering, key/child counts, leaf depth and degree bounds.
pub(super) fn validate<K: Ord + Clone + Debug>(
    root: &Node<K>,
    order: usize,
    len: usize,
) -> Result<(), InvariantViolation> {
    let mut walker = Walker {
        order,
        leaf_depth: None,
    };
    walker.visit(root, 0, true)?;

    let mut keys = Vec::with_capacity(len);
    root.collect_keys(&mut keys);
    for pair in keys.windows(2) {
        if pair[0] >= pair[1] {
            return Err(InvariantViolation::KeysOutOfOrder {
                before: format!("{:?}", pair[0]),
                after: format!("{:?}", pair[1]),
            });
        }
    }
    if keys.len() != len {
        return Err(InvariantViolation::LengthMismatch {
            reported: len,
            found: keys.len(),
        });
    }
    Ok(())
}

struct Walker {
    order: usize,
    leaf_depth: Option<usize>,
}

impl Walker {
    fn visit<K>(
        &mut self,
        node: &Node<K>,
        depth: usize,
        is_root: bool,
    ) -> Result<(), InvariantViolation> {
        let degree = node.keys.len() + 1;
        let max = 2 * self.order;

        if !node.children.is_empty() && node.children.len() != node.keys.len() + 1 {
            return Err(InvariantViolation::KeyChildMismatch {
                keys: node.keys.len(),
                children: node.children.len(),
            });
        }

        if is_root {
            if degree > max {
                return Err(InvariantViolation::DegreeOutOfBounds { degree, min: 1, max });
            }
            if !node.children.is_empty() && degree < 2 {
                return Err(InvariantViolation::RootDegree { degree });
            }
        } else if degree < self.order || degree > max {
            return Err(InvariantViolation::DegreeOutOfBounds {
                degree,
                min: self.order,
                max,
            });
        }

        if node.children.is_empty() {
            match self.leaf_depth {
                None => self.leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(InvariantViolation::UnevenLeafDepth {
                        expected,
                        found: depth,
                    });
                }
                Some(_) => {}
            }
            return Ok(());
        }

        for child in &node.children {
            self.visit(child, depth + 1, false)?;
        }
        Ok(())
    }
}
