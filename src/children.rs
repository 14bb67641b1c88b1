use thiserror::Error;

use crate::api::types::{Child, ChildUpdate, NewChild};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChildFormError {
    #[error("name is required")]
    NameRequired,
}

/// Raw name/grade input for the add and edit screens.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildForm {
    pub name:  String,
    pub grade: String,
}

impl ChildForm {
    pub fn from_child(child: &Child) -> Self {
        Self { name: child.name.clone(), grade: child.grade.clone().unwrap_or_default() }
    }

    fn validated(&self) -> Result<(String, Option<String>), ChildFormError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ChildFormError::NameRequired);
        }
        let grade = Some(self.grade.trim()).filter(|g| !g.is_empty()).map(str::to_owned);
        Ok((name.to_owned(), grade))
    }

    pub fn to_new_child(&self) -> Result<NewChild, ChildFormError> {
        let (name, grade) = self.validated()?;
        Ok(NewChild { name, grade })
    }

    pub fn to_update(&self) -> Result<ChildUpdate, ChildFormError> {
        let (name, grade) = self.validated()?;
        Ok(ChildUpdate { name, grade })
    }
}

pub fn find_child<'a>(children: &'a [Child], id: &str) -> Option<&'a Child> {
    children.iter().find(|c| c.id == id)
}

pub fn grade_label(child: &Child) -> &str {
    child.grade.as_deref().unwrap_or("not set")
}
