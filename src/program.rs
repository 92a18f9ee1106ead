use serde::Serialize;

use crate::models::{MenuItem, MENU_COURSES};

#[derive(Debug, Serialize)]
pub struct MenuCourse {
    pub course: &'static str,
    pub label: &'static str,
    pub items: Vec<MenuItem>,
}

/// Groups items into courses in serving order, dropping empty courses.
/// Items keep the order they were loaded in.
pub fn group_menu(items: Vec<MenuItem>) -> Vec<MenuCourse> {
    let mut courses: Vec<MenuCourse> = MENU_COURSES
        .iter()
        .map(|&(course, label)| MenuCourse { course, label, items: Vec::new() })
        .collect();

    for item in items {
        match courses.iter_mut().find(|c| c.course == item.course) {
            Some(course) => course.items.push(item),
            None => log::warn!("Menu item {} has unknown course '{}'", item.id, item.course),
        }
    }

    courses.retain(|c| !c.items.is_empty());
    courses
}
