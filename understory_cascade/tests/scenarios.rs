// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Document-level cascade scenarios.

use kurbo::Size;
use understory_cascade::{
    ComputeContext, ComputedValue, ElementStyle, NodeId, PropertyId, PropertyRegistry,
    StyleDiagnostic, StyleDocument, StyleError, StyleSheet, ancestors, props,
};
use understory_value::{Color, PropertyValue, Unit, VariableTerm};

fn document(css: &str) -> StyleDocument {
    let registry = PropertyRegistry::standard();
    let sheet = StyleSheet::parse(&registry, css).expect("test style sheet should parse");
    StyleDocument::new(registry, sheet)
}

fn color(doc: &StyleDocument, node: NodeId, id: PropertyId) -> Option<Color> {
    doc.computed(node, id).and_then(ComputedValue::as_color)
}

fn length(doc: &StyleDocument, node: NodeId, id: PropertyId) -> Option<f32> {
    doc.computed(node, id).and_then(ComputedValue::as_length)
}

fn specified(doc: &StyleDocument, node: NodeId, id: PropertyId) -> Option<String> {
    doc.get_property(node, id).map(ToString::to_string)
}

const GREEN: Color = Color::rgb(0, 255, 0);
const RED: Color = Color::rgb(255, 0, 0);
const BLUE: Color = Color::rgb(0, 0, 255);

#[test]
fn basic() {
    let mut doc = document(
        "* { color: #00ff00 }
         body { --color-var: #ffffff }
         div { background-color: var(--color-var); --color2-var: var(--color-var) }
         p { background-color: var(--color2-var); color: var(--missing-var, #ff0000) }",
    );
    let div = doc.append_child(doc.root(), "div");
    let p = doc.append_child(div, "p");
    let report = doc.update();
    assert_eq!(report.diagnostics().count(), 0);

    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(Color::WHITE));
    assert_eq!(color(&doc, div, props::COLOR), Some(GREEN));
    // Through a variable declared on the parent.
    assert_eq!(color(&doc, p, props::BACKGROUND_COLOR), Some(Color::WHITE));
    assert_eq!(color(&doc, p, props::COLOR), Some(RED));

    doc.set_property(div, "--color-var", "#000000").unwrap();
    let report = doc.update();
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(Color::BLACK));
    assert_eq!(color(&doc, p, props::BACKGROUND_COLOR), Some(Color::BLACK));
    assert!(
        report
            .node(p)
            .unwrap()
            .changed_properties
            .contains(props::BACKGROUND_COLOR)
    );

    let raw = |node| {
        doc.get_property_variable(node, "--color-var")
            .map(ToString::to_string)
    };
    assert_eq!(raw(div).as_deref(), Some("#000000"));
    assert_eq!(raw(doc.root()).as_deref(), Some("#ffffff"));
}

#[test]
fn shorthands() {
    let mut doc = document(
        "body { --padding-var: 20px 5px; --v-padding-var: 3px; --h-padding-var: 7px }
         div { padding: var(--padding-var) }
         p { padding: var(--v-padding-var) var(--h-padding-var) }",
    );
    let div = doc.append_child(doc.root(), "div");
    let p = doc.append_child(doc.root(), "p");
    doc.update();
    assert_eq!(length(&doc, div, props::PADDING_TOP), Some(20.0));
    assert_eq!(length(&doc, div, props::PADDING_RIGHT), Some(5.0));

    // A longhand override beats the shorthand.
    doc.set_property(div, "padding-top", "6px").unwrap();
    doc.update();
    assert_eq!(length(&doc, div, props::PADDING_TOP), Some(6.0));
    assert_eq!(length(&doc, div, props::PADDING_BOTTOM), Some(20.0));

    doc.set_property(div, "--padding-var", "15px 0px").unwrap();
    assert!(doc.remove_property(div, "padding-top").unwrap());
    doc.update();
    assert_eq!(length(&doc, div, props::PADDING_TOP), Some(15.0));
    assert_eq!(length(&doc, div, props::PADDING_LEFT), Some(0.0));

    // Several references in one shorthand.
    assert_eq!(length(&doc, p, props::PADDING_BOTTOM), Some(3.0));
    assert_eq!(length(&doc, p, props::PADDING_LEFT), Some(7.0));
    doc.set_property(doc.root(), "--v-padding-var", "1px").unwrap();
    let report = doc.update();
    assert_eq!(length(&doc, p, props::PADDING_BOTTOM), Some(1.0));
    assert_eq!(length(&doc, p, props::PADDING_LEFT), Some(7.0));
    let changed = &report.node(p).unwrap().changed_properties;
    assert!(changed.contains(props::PADDING_TOP));
    assert!(changed.contains(props::PADDING_BOTTOM));
    assert!(!changed.contains(props::PADDING_LEFT));
}

#[test]
fn inheritance_is_scoped() {
    let mut doc = document(
        "body { --bg-color: #ffffff }
         div { --bg-color: #00ff00 }
         p { background-color: var(--bg-color) }",
    );
    let div = doc.append_child(doc.root(), "div");
    let p1 = doc.append_child(div, "p");
    let p2 = doc.append_child(doc.root(), "p");
    doc.update();
    assert_eq!(color(&doc, p1, props::BACKGROUND_COLOR), Some(GREEN));
    assert_eq!(color(&doc, p2, props::BACKGROUND_COLOR), Some(Color::WHITE));
}

#[test]
fn circular_variables_report_once() {
    let mut doc = document(
        "body { --bg-color: var(--bg2-color); --bg2-color: var(--bg-color) }
         div { background-color: var(--bg-color) }",
    );
    let div = doc.append_child(doc.root(), "div");
    let report = doc.update();

    let diagnostics: Vec<_> = report.diagnostics().collect();
    assert_eq!(
        diagnostics,
        [&StyleDiagnostic::CyclicVariable {
            cycle: vec!["--bg-color".into(), "--bg2-color".into()],
        }]
    );
    // The dependent property falls back to its default.
    assert_eq!(
        color(&doc, div, props::BACKGROUND_COLOR),
        Some(Color::TRANSPARENT)
    );
}

#[test]
fn declaration_order_does_not_matter() {
    let resolve = |css: &str| {
        let mut doc = document(css);
        let div = doc.append_child(doc.root(), "div");
        let report = doc.update();
        assert_eq!(report.diagnostics().count(), 0, "{css}");
        color(&doc, div, props::BACKGROUND_COLOR)
    };
    let forward = resolve(
        "body { --bg1-color: var(--bg2-color); --bg2-color: var(--bg3-color); --bg3-color: #ffffff }
         div { background-color: var(--bg1-color) }",
    );
    let backward = resolve(
        "div { background-color: var(--bg1-color) }
         body { --bg3-color: #ffffff; --bg2-color: var(--bg3-color); --bg1-color: var(--bg2-color) }",
    );
    assert_eq!(forward, Some(Color::WHITE));
    assert_eq!(forward, backward);
}

#[test]
fn fallback_until_declared() {
    let mut doc = document("div { background-color: var(--bg-var, #000000) }");
    let div = doc.append_child(doc.root(), "div");
    let report = doc.update();
    assert_eq!(report.diagnostics().count(), 0);
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(Color::BLACK));

    doc.set_property(div, "--bg-var", "#ffffff").unwrap();
    doc.update();
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(Color::WHITE));

    assert!(doc.remove_property(div, "--bg-var").unwrap());
    doc.update();
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(Color::BLACK));
}

#[test]
fn class_change_switches_to_variable() {
    let mut doc = document(
        "div { background-color: red }
         div.active { --color: blue; background-color: var(--color) }",
    );
    let div = doc.append_child(doc.root(), "div");
    doc.update();
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(RED));

    assert!(doc.set_class(div, "active", true));
    let report = doc.update();
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(BLUE));
    assert!(
        report
            .node(div)
            .unwrap()
            .changed_properties
            .contains(props::BACKGROUND_COLOR)
    );

    doc.set_class(div, "active", false);
    doc.update();
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(RED));
}

#[test]
fn class_change_through_variable_chain() {
    let mut doc = document(
        "div { background-color: red }
         div.active { --new-color: blue; --color: var(--new-color); background-color: var(--color) }",
    );
    let div = doc.append_child(doc.root(), "div");
    doc.update();
    doc.set_class(div, "active", true);
    let report = doc.update();
    assert_eq!(report.diagnostics().count(), 0);
    assert_eq!(color(&doc, div, props::BACKGROUND_COLOR), Some(BLUE));
}

#[test]
fn class_change_to_dependent_shorthand() {
    let mut doc = document(
        "div { padding: 10px }
         div.active { --padding: 20px; padding: var(--padding) }",
    );
    let div = doc.append_child(doc.root(), "div");
    doc.update();
    assert_eq!(length(&doc, div, props::PADDING_LEFT), Some(10.0));

    doc.set_class(div, "active", true);
    doc.update();
    for id in [
        props::PADDING_TOP,
        props::PADDING_RIGHT,
        props::PADDING_BOTTOM,
        props::PADDING_LEFT,
    ] {
        assert_eq!(length(&doc, div, id), Some(20.0));
    }

    doc.set_class(div, "active", false);
    doc.update();
    assert_eq!(length(&doc, div, props::PADDING_TOP), Some(10.0));
}

#[test]
fn changing_a_variable_touches_only_its_dependents() {
    let mut doc = document(
        "body { --a: 1px; --b: 2px }
         div { padding-top: var(--a); padding-bottom: var(--b); margin-top: var(--a); width: 5px }",
    );
    let div = doc.append_child(doc.root(), "div");
    doc.update();

    doc.set_property(doc.root(), "--a", "5px").unwrap();
    let report = doc.update();
    let out = report.node(div).unwrap();
    let changed: Vec<_> = out.changed_properties.iter().collect();
    assert_eq!(changed, [props::PADDING_TOP, props::MARGIN_TOP]);
    assert_eq!(out.changed_variables, ["--a"]);
    assert_eq!(length(&doc, div, props::PADDING_BOTTOM), Some(2.0));
}

#[test]
fn viewport_change_dirties_viewport_lengths_only() {
    let mut doc = document("");
    let div = doc.append_child(doc.root(), "div");
    let span = doc.append_child(doc.root(), "span");
    doc.set_property(div, "width", "50vw").unwrap();
    doc.set_property(div, "height", "10px").unwrap();
    doc.set_property(div, "padding-top", "2em").unwrap();
    doc.set_property(span, "width", "30px").unwrap();
    doc.update();
    assert_eq!(length(&doc, div, props::WIDTH), Some(0.0));

    doc.set_viewport(Size::new(1000.0, 500.0));
    assert!(doc.style(div).any_properties_dirty());
    assert!(!doc.style(span).any_properties_dirty());
    assert!(!doc.style(doc.root()).any_properties_dirty());

    let report = doc.update();
    let changed: Vec<_> = report.node(div).unwrap().changed_properties.iter().collect();
    assert_eq!(changed, [props::WIDTH]);
    assert!(report.node(span).is_none());
    assert_eq!(length(&doc, div, props::WIDTH), Some(500.0));
}

#[test]
fn subtree_unit_dirtying_leaves_siblings_clean() {
    let mut doc = document("div { width: 2em } span { padding-left: 1em }");
    let left = doc.append_child(doc.root(), "div");
    let left_child = doc.append_child(left, "span");
    let right = doc.append_child(doc.root(), "div");
    let right_child = doc.append_child(right, "span");
    doc.update();

    doc.dirty_properties_with_units_recursive(left, Unit::EM);
    assert!(doc.style(left).any_properties_dirty());
    assert!(doc.style(left_child).any_properties_dirty());
    assert!(!doc.style(right).any_properties_dirty());
    assert!(!doc.style(right_child).any_properties_dirty());
    assert!(!doc.style(doc.root()).any_properties_dirty());

    // Same context, same values.
    let report = doc.update();
    assert!(report.nodes.is_empty());
    assert!(!doc.style(left_child).any_properties_dirty());
    assert_eq!(length(&doc, left, props::WIDTH), Some(24.0));
    assert_eq!(length(&doc, right_child, props::PADDING_LEFT), Some(12.0));
}

#[test]
fn dp_ratio_scales_dp_lengths() {
    let mut doc = document("div { margin-left: 4dp }");
    let div = doc.append_child(doc.root(), "div");
    doc.update();
    assert_eq!(length(&doc, div, props::MARGIN_LEFT), Some(4.0));
    doc.set_dp_ratio(2.0);
    doc.update();
    assert_eq!(length(&doc, div, props::MARGIN_LEFT), Some(8.0));
}

#[test]
fn font_relative_lengths_follow_font_size() {
    let mut doc = document(
        "body { font-size: 20px }
         div { font-size: 2em; padding-left: 1em; margin-left: 1rem }",
    );
    let div = doc.append_child(doc.root(), "div");
    let span = doc.append_child(div, "span");
    doc.update();
    assert_eq!(length(&doc, div, props::FONT_SIZE), Some(40.0));
    assert_eq!(length(&doc, div, props::PADDING_LEFT), Some(40.0));
    assert_eq!(length(&doc, div, props::MARGIN_LEFT), Some(20.0));
    // Inherited as a computed length.
    assert_eq!(length(&doc, span, props::FONT_SIZE), Some(40.0));

    doc.set_property(doc.root(), "font-size", "10px").unwrap();
    let report = doc.update();
    assert_eq!(length(&doc, div, props::FONT_SIZE), Some(20.0));
    assert_eq!(length(&doc, div, props::PADDING_LEFT), Some(20.0));
    assert_eq!(length(&doc, div, props::MARGIN_LEFT), Some(10.0));
    assert_eq!(length(&doc, span, props::FONT_SIZE), Some(20.0));
    let changed = &report.node(div).unwrap().changed_properties;
    assert!(changed.contains(props::FONT_SIZE));
    assert!(changed.contains(props::MARGIN_LEFT));
}

#[test]
fn flex_shorthand_table() {
    let cases: [(&str, f32, f32, ComputedValue); 13] = [
        ("", 0.0, 1.0, ComputedValue::Keyword("auto".into())),
        ("none", 0.0, 0.0, ComputedValue::Keyword("auto".into())),
        ("auto", 1.0, 1.0, ComputedValue::Keyword("auto".into())),
        ("1", 1.0, 1.0, ComputedValue::Length(0.0)),
        ("2", 2.0, 1.0, ComputedValue::Length(0.0)),
        ("2 0", 2.0, 0.0, ComputedValue::Length(0.0)),
        ("2 3", 2.0, 3.0, ComputedValue::Length(0.0)),
        ("2 auto", 2.0, 1.0, ComputedValue::Keyword("auto".into())),
        ("2 0 auto", 2.0, 0.0, ComputedValue::Keyword("auto".into())),
        ("0 0 auto", 0.0, 0.0, ComputedValue::Keyword("auto".into())),
        ("0 0 50px", 0.0, 0.0, ComputedValue::Length(50.0)),
        ("0 0 0", 0.0, 0.0, ComputedValue::Length(0.0)),
        ("30%", 1.0, 1.0, ComputedValue::Percentage(30.0)),
    ];
    let mut doc = document("");
    let nodes: Vec<NodeId> = cases
        .iter()
        .map(|(text, ..)| {
            let node = doc.append_child(doc.root(), "div");
            if !text.is_empty() {
                doc.set_property(node, "flex", text).unwrap();
            }
            node
        })
        .collect();
    doc.update();
    for (node, (text, grow, shrink, basis)) in nodes.into_iter().zip(cases) {
        let number = |id| doc.computed(node, id).and_then(ComputedValue::as_number);
        assert_eq!(number(props::FLEX_GROW), Some(grow), "flex: {text}");
        assert_eq!(number(props::FLEX_SHRINK), Some(shrink), "flex: {text}");
        assert_eq!(doc.computed(node, props::FLEX_BASIS), Some(&basis), "flex: {text}");
    }
}

#[test]
fn unresolved_reference_keeps_previous_value() {
    let mut doc = document("");
    let div = doc.append_child(doc.root(), "div");
    doc.set_property(doc.root(), "--c", "#0000ff").unwrap();
    doc.set_property(div, "color", "var(--c)").unwrap();
    doc.set_property(div, "width", "var(--nope)").unwrap();
    let report = doc.update();
    assert_eq!(
        report.diagnostics().collect::<Vec<_>>(),
        [&StyleDiagnostic::UnresolvedVariable {
            referrer: "width".into(),
            name: "--nope".into(),
        }]
    );
    assert_eq!(color(&doc, div, props::COLOR), Some(BLUE));
    assert_eq!(
        doc.computed(div, props::WIDTH),
        Some(&ComputedValue::Keyword("auto".into()))
    );

    assert!(doc.remove_property(doc.root(), "--c").unwrap());
    let report = doc.update();
    assert_eq!(report.diagnostics().count(), 1);
    assert_eq!(color(&doc, div, props::COLOR), Some(BLUE));
    // The specified value skips the failed declaration.
    assert_eq!(specified(&doc, div, props::COLOR).as_deref(), Some("#000000"));
}

#[test]
fn substituted_text_is_checked_against_grammars() {
    let mut doc = document("");
    let div = doc.append_child(doc.root(), "div");
    doc.set_property(div, "--w", "red").unwrap();
    doc.set_property(div, "width", "var(--w)").unwrap();
    doc.set_property(div, "--p", "1px 2px 3px 4px 5px").unwrap();
    doc.set_property(div, "padding", "var(--p)").unwrap();
    let report = doc.update();
    let diagnostics: Vec<_> = report.diagnostics().cloned().collect();
    assert_eq!(diagnostics.len(), 2);
    assert!(diagnostics.contains(&StyleDiagnostic::InvalidValue {
        property: "width",
        text: "red".into(),
    }));
    assert!(diagnostics.contains(&StyleDiagnostic::MalformedShorthand {
        shorthand: "padding",
        text: "1px 2px 3px 4px 5px".into(),
    }));
    assert_eq!(length(&doc, div, props::PADDING_TOP), Some(0.0));
}

#[test]
fn rejected_mutations_leave_state_alone() {
    let mut doc = document("");
    let div = doc.append_child(doc.root(), "div");
    doc.set_property(div, "padding", "1px").unwrap();

    assert!(matches!(
        doc.set_property(div, "padding", "1px 2px 3px 4px 5px"),
        Err(StyleError::MalformedShorthand {
            shorthand: "padding",
            ..
        })
    ));
    assert!(matches!(
        doc.set_property(div, "colour", "red"),
        Err(StyleError::UnknownProperty(name)) if name == "colour"
    ));
    assert!(doc.set_property(div, "width", "red").is_err());

    let registry = PropertyRegistry::standard();
    let angle = PropertyValue::numeric(45.0, Unit::DEG);
    assert!(matches!(
        doc.style_mut(div).set_property(&registry, props::WIDTH, angle),
        Err(StyleError::UnitMismatch {
            property: "width",
            ..
        })
    ));

    doc.update();
    assert_eq!(length(&doc, div, props::PADDING_RIGHT), Some(1.0));
    assert_eq!(
        doc.computed(div, props::WIDTH),
        Some(&ComputedValue::Keyword("auto".into()))
    );
}

#[test]
fn specified_values_and_local_lookup() {
    let mut doc = document("div { opacity: 0.5 }");
    let div = doc.append_child(doc.root(), "div");
    doc.set_property(doc.root(), "color", "#0000ff").unwrap();
    doc.set_property(div, "margin", "1px 2px").unwrap();
    doc.set_property(div, "--gap", "4px").unwrap();
    doc.set_property(div, "padding", "var(--gap)").unwrap();
    doc.update();

    // Unset and not inherited: the default.
    assert_eq!(specified(&doc, div, props::WIDTH).as_deref(), Some("auto"));
    // Inherited from the root.
    assert_eq!(specified(&doc, div, props::COLOR).as_deref(), Some("#0000ff"));
    // From the matched rules.
    assert_eq!(specified(&doc, div, props::OPACITY).as_deref(), Some("0.5"));
    // Substituted.
    assert_eq!(specified(&doc, div, props::PADDING_TOP).as_deref(), Some("4px"));

    let style = doc.style(div);
    assert_eq!(
        style.get_local_property(props::MARGIN_RIGHT).map(ToString::to_string),
        Some("2px".into())
    );
    // Occupied by a dependent shorthand.
    assert_eq!(style.get_local_property(props::PADDING_TOP), None);
    assert_eq!(style.get_local_property(props::OPACITY), None);
    assert_eq!(
        style.get_local_property_variable("--gap").map(ToString::to_string),
        Some("4px".into())
    );
    assert_eq!(style.iter_local().count(), 8);
    assert!(!style.any_properties_dirty());
}

#[test]
fn dirty_variable_names_before_compute() {
    let mut doc = document("");
    let div = doc.append_child(doc.root(), "div");
    doc.update();
    doc.set_property(div, "--b", "1px").unwrap();
    doc.set_property(div, "--a", "2px").unwrap();
    assert_eq!(doc.style(div).dirty_property_variables(), ["--a", "--b"]);
    doc.update();
    assert!(doc.style(div).dirty_property_variables().is_empty());
}

#[test]
fn pseudo_classes_and_sheet_swaps() {
    let mut doc = document("p:hover { color: #ff0000 }");
    let p = doc.append_child(doc.root(), "p");
    doc.update();
    assert_eq!(color(&doc, p, props::COLOR), Some(Color::BLACK));

    assert!(doc.set_pseudo_class(p, "hover", true));
    doc.update();
    assert_eq!(color(&doc, p, props::COLOR), Some(RED));

    let sheet = StyleSheet::parse(doc.registry(), "p { opacity: 0.25 }").unwrap();
    doc.set_style_sheet(sheet);
    let report = doc.update();
    assert_eq!(color(&doc, p, props::COLOR), Some(Color::BLACK));
    assert_eq!(
        doc.computed(p, props::OPACITY).and_then(ComputedValue::as_number),
        Some(0.25)
    );
    let changed = &report.node(p).unwrap().changed_properties;
    assert!(changed.contains(props::COLOR));
    assert!(changed.contains(props::OPACITY));
}

#[test]
fn element_styles_with_custom_lookup() {
    let registry = PropertyRegistry::standard();
    let sheet = StyleSheet::new();
    let cx = ComputeContext::new(&registry, &sheet);
    let no_parents = |_: usize| -> Option<(&ElementStyle, Option<usize>)> { None };

    let mut section = ElementStyle::new("section");
    section.set_property_variable("--accent", VariableTerm::literal("#00ff00"));
    section
        .set_property_text(&registry, "font-size", "16px")
        .unwrap();
    section.compute_values(&cx, None, &no_parents);

    let nodes = [&section];
    let lookup = |key: usize| -> Option<(&ElementStyle, Option<usize>)> {
        nodes.get(key).map(|style| (*style, None))
    };
    assert_eq!(ancestors(&lookup, Some(0_usize)).count(), 1);

    let mut span = ElementStyle::new("span");
    span.set_property_text(&registry, "color", "var(--accent)")
        .unwrap();
    span.set_property_text(&registry, "width", "2em").unwrap();
    let out = span.compute_values(&cx, Some(0_usize), &lookup);
    assert!(out.diagnostics.is_empty());
    assert_eq!(span.computed().get(props::COLOR), Some(&ComputedValue::Color(GREEN)));
    assert_eq!(span.computed().get(props::WIDTH), Some(&ComputedValue::Length(32.0)));

    // Nothing dirty: nothing changes.
    let out = span.compute_values(&cx, Some(0_usize), &lookup);
    assert!(out.is_empty());

    assert_eq!(
        span.get_property_variable("--accent", Some(0_usize), &lookup)
            .map(ToString::to_string),
        Some("#00ff00".into())
    );
}
