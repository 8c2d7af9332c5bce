use crate::display::{ConsoleSurface, DisplayError, Font, LabeledValue, StatusSurface};

fn element(value: &str) -> LabeledValue {
    LabeledValue {
        label: "UPS".to_string(),
        value: value.to_string(),
        position: (140, 0),
        label_font: Font::Bold,
        text_font: Font::Medium,
    }
}

#[test]
fn console_surface_reports_width() {
    assert_eq!(ConsoleSurface::new(250).width(), 250);
}

#[test]
fn remove_unknown_element_fails() {
    let mut surface = ConsoleSurface::new(250);
    assert_eq!(
        surface.remove_element("ups"),
        Err(DisplayError::ElementNotFound("ups".to_string()))
    );
}

#[test]
fn add_set_and_remove_element() {
    let mut surface = ConsoleSurface::new(250);
    surface.add_element("ups", element("0%"));
    surface.set("ups", "42%".to_string());
    surface.update(true, &[("status", "Battery exhausted, bye ...")]);

    assert!(surface.remove_element("ups").is_ok());
    assert!(surface.remove_element("ups").is_err());
}
