//! The report template language.
//!
//! A Jinja-compatible subset: `{{ expr }}` output, `{% if %}`, `{% for %}` and
//! `{% set %}` statements, `{# #}` comments, filters and tests. Output is never
//! auto-escaped. Blocks alone on a line do not leave blank lines behind.
//!
//! Supported beyond plain expressions: `{% for x in xs if cond %}` loop
//! filters, `{% raw %}`, and the filters listed in `filters::FILTERS`. Macros,
//! `include`, `extends` and user-defined tests are not.

mod eval;
mod filters;
mod lexer;
mod parser;
mod value;

use crate::report_engine::error::TemplateError;
use common::model::context::ReportContext;

pub use filters::thousands;

/// A parsed template, ready to render against any number of contexts.
#[derive(Debug, Clone)]
pub struct Template {
    nodes: Vec<parser::Node>,
}

/// One trailing newline of the source is dropped, as Jinja does by default.
pub fn compile(source: &str) -> Result<Template, TemplateError> {
    let source = source
        .strip_suffix("\r\n")
        .or_else(|| source.strip_suffix('\n'))
        .unwrap_or(source);
    let segments = lexer::segment(source)?;
    let nodes = parser::parse(segments)?;
    Ok(Template { nodes })
}

impl Template {
    pub fn render(&self, context: &ReportContext) -> Result<String, TemplateError> {
        eval::render(&self.nodes, context)
    }
}

/// Compiles and renders `source` in one go.
pub fn render_text(source: &str, context: &ReportContext) -> Result<String, TemplateError> {
    compile(source)?.render(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::model::context::ContextValue;

    fn render(source: &str, context: &ReportContext) -> String {
        render_text(source, context).unwrap()
    }

    fn empty() -> ReportContext {
        ReportContext::new()
    }

    #[test]
    fn renders_a_comma_formatted_total() {
        let context = ReportContext::new().with("total_views", 2_500_000i64);
        assert_eq!(
            render("Views: {{ total_views | format_comma }}", &context),
            "Views: 2,500,000"
        );
        assert_eq!(render("{{ format_comma(1234567) }}", &empty()), "1,234,567");
        assert_eq!(render("{{ 'abc' | format_comma }}", &empty()), "abc");
    }

    #[test]
    fn undefined_names_render_empty() {
        assert_eq!(render("[{{ missing }}]", &empty()), "[]");
        assert_eq!(render("{{ missing | default('n/a') }}", &empty()), "n/a");
        assert_eq!(render("{% if missing is defined %}yes{% else %}no{% endif %}", &empty()), "no");
    }

    #[test]
    fn attribute_of_undefined_is_an_error() {
        let err = render_text("a\n{{ missing.field }}", &empty()).unwrap_err();
        assert_eq!(err, TemplateError::render(2, "'missing' is undefined"));
    }

    #[test]
    fn syntax_errors_carry_the_line() {
        let err = render_text("line one\n{% if %}x{% endif %}", &empty()).unwrap_err();
        assert!(matches!(err, TemplateError::Syntax { line: 2, .. }));
        assert!(render_text("{{ x | nope }}", &empty()).is_err());
    }

    #[test]
    fn values_print_in_literal_form() {
        let context = ReportContext::new()
            .with("ratio", 2.0)
            .with("flag", true)
            .with("nothing", ContextValue::Null)
            .with("tags", vec!["a", "b"]);
        assert_eq!(
            render("{{ ratio }} {{ flag }} {{ nothing }} {{ tags }}", &context),
            "2.0 True None ['a', 'b']"
        );
    }

    #[test]
    fn arithmetic_and_rounding() {
        let context = ReportContext::new().with("rate", 0.04567).with("views", 7i64);
        assert_eq!(render("{{ (rate * 100) | round(2) }}%", &context), "4.57%");
        assert_eq!(render("{{ views // 2 }} {{ views % 4 }} {{ views / 2 }}", &context), "3 3 3.5");
        assert_eq!(render("{{ -7 // 2 }} {{ -7 % 3 }}", &empty()), "-4 2");
        assert_eq!(render("{{ 'a' ~ views ~ 'b' }}", &context), "a7b");
        assert!(render_text("{{ views / 0 }}", &context).is_err());
    }

    #[test]
    fn if_elif_else_chains() {
        let template = compile(
            "{% if kind == 'Hourly' %}hour{% elif kind in ['Day Parts', 'Week Analysis'] %}period{% else %}other{% endif %}",
        )
        .unwrap();
        let with = |kind: &str| template.render(&ReportContext::new().with("kind", kind)).unwrap();
        assert_eq!(with("Hourly"), "hour");
        assert_eq!(with("Week Analysis"), "period");
        assert_eq!(with("Monthly"), "other");
    }

    #[test]
    fn for_loops_expose_loop_state() {
        let context = ReportContext::new().with(
            "tiers",
            vec![
                ContextValue::record([("tier", ContextValue::from("Micro")), ("views", 1200i64.into())]),
                ContextValue::record([("tier", ContextValue::from("Star")), ("views", 5i64.into())]),
            ],
        );
        let source = "{% for t in tiers %}{{ loop.index }}/{{ loop.length }} {{ t.tier }}={{ t.views | format_comma }}{% if not loop.last %}, {% endif %}{% endfor %}";
        assert_eq!(render(source, &context), "1/2 Micro=1,200, 2/2 Star=5");
    }

    #[test]
    fn for_else_runs_on_empty_sequences() {
        let context = ReportContext::new().with("rows", Vec::<ContextValue>::new());
        assert_eq!(render("{% for r in rows %}x{% else %}empty{% endfor %}", &context), "empty");
        assert_eq!(render("{% for r in missing %}x{% else %}empty{% endfor %}", &context), "empty");
    }

    #[test]
    fn unpacks_record_items() {
        let context = ReportContext::new().with(
            "counts",
            ContextValue::record([("a", 1i64), ("b", 2i64)]),
        );
        assert_eq!(
            render("{% for k, v in counts.items() %}{{ k }}:{{ v }};{% endfor %}", &context),
            "a:1;b:2;"
        );
    }

    #[test]
    fn set_inside_a_loop_does_not_leak() {
        let source = "{% set total = 0 %}{% for n in range(3) %}{% set total = total + n %}{% endfor %}{{ total }}";
        assert_eq!(render(source, &empty()), "0");
        assert_eq!(render("{% set x = 2 %}{% if true %}{% set x = 3 %}{% endif %}{{ x }}", &empty()), "3");
    }

    #[test]
    fn blocks_on_their_own_lines_leave_no_blank_lines() {
        let context = ReportContext::new().with("items", vec![1i64, 2]);
        let source = "Items:\n{% for i in items %}\n  - {{ i }}\n{% endfor %}\nDone";
        assert_eq!(render(source, &context), "Items:\n  - 1\n  - 2\nDone");
    }

    #[test]
    fn drops_a_single_trailing_newline() {
        let context = ReportContext::new().with("n", 5i64);
        assert_eq!(render("Views: {{ n }}\n", &context), "Views: 5");
        assert_eq!(render("Views: {{ n }}\r\n", &context), "Views: 5");
        assert_eq!(render("Views: {{ n }}\n\n", &context), "Views: 5\n");
        assert_eq!(render("{% if n %}\nyes\n{% endif %}\n", &context), "yes\n");
    }

    #[test]
    fn loop_filters_skip_items_before_counting() {
        let context = ReportContext::new().with("views", vec![5i64, 0, 12, 0, 3]);
        let source = "{% for v in views if v > 0 %}{{ loop.index }}/{{ loop.length }}={{ v }} {% endfor %}";
        assert_eq!(render(source, &context), "1/3=5 2/3=12 3/3=3 ");
        assert_eq!(
            render("{% for v in views if v > 100 %}x{% else %}none{% endfor %}", &context),
            "none"
        );
    }

    #[test]
    fn raw_blocks_and_aggregate_filters() {
        let context = ReportContext::new().with("views", vec![5i64, 12, 3]);
        assert_eq!(render("{% raw %}{{ views }}{% endraw %}", &context), "{{ views }}");
        assert_eq!(
            render("{{ views | sum }} {{ views | min }} {{ views | max }}", &context),
            "20 3 12"
        );
        assert_eq!(render("{{ 1e16 }} {{ 2.5e2 }}", &empty()), "1e+16 250.0");
    }

    #[test]
    fn inline_conditionals_and_format() {
        let context = ReportContext::new().with("diff", -3.27).with("count", 1i64);
        assert_eq!(render("{{ '%+.1f' | format(diff) }}%", &context), "-3.3%");
        assert_eq!(render("{{ 'item' ~ ('' if count == 1 else 's') }}", &context), "item");
        assert_eq!(render("{{ '%s of %s' % [1, 2] }}", &empty()), "1 of 2");
    }

    #[test]
    fn no_auto_escaping() {
        let context = ReportContext::new().with("name", "<b>R&D</b>");
        assert_eq!(render("{{ name }}", &context), "<b>R&D</b>");
    }

    #[test]
    fn compiled_template_renders_repeatedly() {
        let template = compile("{{ n * 2 }}").unwrap();
        assert_eq!(template.render(&ReportContext::new().with("n", 2i64)).unwrap(), "4");
        assert_eq!(template.render(&ReportContext::new().with("n", 5i64)).unwrap(), "10");
    }
}
