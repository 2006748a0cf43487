use page_toolkit::{Error, Page, Result, ToastKind, DEFAULT_DELETE_PROMPT};

const QUIZ_PAGE: &str = r#"
<body>
  <div class='alert alert-info' id='flash-1'>Saved</div>
  <div class='alert alert-error' id='flash-2'>Try again</div>
  <form id='quiz-form'>
    <input id='name' required>
    <textarea id='answer' required></textarea>
    <label class='option-label' id='opt-a'><input type='radio' name='q1' id='radio-a'>A</label>
    <label class='option-label' id='opt-b'><input type='radio' name='q1' id='radio-b'>B</label>
    <label class='option-label' id='opt-empty'>no input here</label>
    <button id='submit-btn'>Submit answer</button>
  </form>
</body>
"#;

#[test]
fn alerts_fade_then_disappear_on_schedule() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    page.init();

    page.advance_time(4_999)?;
    page.assert_exists("#flash-1")?;
    assert_eq!(page.style_value("#flash-1", "opacity")?, None);

    page.advance_time(1)?;
    page.assert_exists("#flash-1")?;
    assert_eq!(page.style_value("#flash-1", "opacity")?.as_deref(), Some("0"));
    assert_eq!(
        page.style_value("#flash-1", "transition")?.as_deref(),
        Some("opacity 0.3s")
    );

    page.advance_time(299)?;
    page.assert_exists("#flash-1")?;
    page.advance_time(1)?;
    page.assert_not_exists("#flash-1")?;
    page.assert_not_exists("#flash-2")?;
    Ok(())
}

#[test]
fn init_without_matching_elements_is_a_no_op() -> Result<()> {
    let mut page = Page::from_html("<p id='only'>hello</p>")?;
    let handle = page.init();
    assert!(handle.is_empty());
    assert!(page.pending_timers().is_empty());
    page.advance_time(10_000)?;
    page.assert_exists("#only")?;
    Ok(())
}

#[test]
fn dispose_cancels_alert_timers_and_label_listeners() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    let handle = page.init();
    assert_eq!(page.pending_timers().len(), 2);

    page.dispose(handle);
    assert!(page.pending_timers().is_empty());

    page.advance_time(10_000)?;
    page.assert_exists("#flash-1")?;

    page.click("#opt-a")?;
    page.assert_checked("#radio-a", false)?;
    Ok(())
}

#[test]
fn validate_form_reports_missing_form_without_side_effects() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    assert!(!page.validate_form("no-such-form"));
    assert_eq!(page.style_value("#name", "border-color")?, None);
    Ok(())
}

#[test]
fn validate_form_with_no_required_fields_is_true() -> Result<()> {
    let mut page = Page::from_html("<form id='f'><input id='free'></form>")?;
    assert!(page.validate_form("f"));
    assert_eq!(page.style_value("#free", "border-color")?, None);
    Ok(())
}

#[test]
fn validate_form_marks_blank_required_fields() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    page.type_text("#name", "   ")?;

    assert!(!page.validate_form("quiz-form"));
    assert_eq!(
        page.style_value("#name", "border-color")?.as_deref(),
        Some("#f44336")
    );
    assert_eq!(
        page.style_value("#answer", "border-color")?.as_deref(),
        Some("#f44336")
    );
    Ok(())
}

#[test]
fn validate_form_clears_marks_once_fields_are_filled() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    assert!(!page.validate_form("quiz-form"));
    assert_eq!(
        page.style_value("#name", "border-color")?.as_deref(),
        Some("#f44336")
    );

    page.type_text("#name", "Taro")?;
    page.type_text("#answer", "because")?;
    page.assert_value("#name", "Taro")?;
    page.assert_value("#answer", "because")?;
    assert!(page.validate_form("quiz-form"));
    assert_eq!(page.style_value("#name", "border-color")?, None);
    assert_eq!(page.style_value("#answer", "border-color")?, None);
    Ok(())
}

#[test]
fn confirm_delete_uses_default_prompt_and_queued_answers() -> Result<()> {
    let mut page = Page::from_html("<p>x</p>")?;

    assert!(!page.confirm_delete(None));

    page.queue_confirm_response(true);
    assert!(page.confirm_delete(Some("Delete this question?")));

    page.set_default_confirm_response(true);
    assert!(page.confirm_delete(None));

    let prompts = page.take_confirm_prompts();
    assert_eq!(
        prompts,
        vec![
            DEFAULT_DELETE_PROMPT.to_string(),
            "Delete this question?".to_string(),
            DEFAULT_DELETE_PROMPT.to_string(),
        ]
    );
    Ok(())
}

#[test]
fn smooth_scroll_records_target_and_ignores_missing_ids() -> Result<()> {
    let mut page = Page::from_html("<div id='section-2'>late content</div>")?;
    assert_eq!(page.scroll_target_id(), None);

    page.smooth_scroll_to("nowhere");
    assert_eq!(page.scroll_target_id(), None);

    page.smooth_scroll_to("section-2");
    assert_eq!(page.scroll_target_id().as_deref(), Some("section-2"));
    Ok(())
}

#[test]
fn button_loading_round_trip_restores_exact_label() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;

    page.set_button_loading("submit-btn", true);
    assert!(page.is_disabled("#submit-btn")?);
    page.assert_text("#submit-btn", "Loading...")?;

    page.set_button_loading("submit-btn", false);
    assert!(!page.is_disabled("#submit-btn")?);
    page.assert_text("#submit-btn", "Submit answer")?;
    Ok(())
}

#[test]
fn repeated_loading_calls_keep_the_original_label() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;

    page.set_button_loading("submit-btn", true);
    page.set_button_loading("submit-btn", true);
    page.set_button_loading("submit-btn", false);
    page.assert_text("#submit-btn", "Submit answer")?;
    Ok(())
}

#[test]
fn unloading_without_prior_loading_keeps_label() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    page.set_button_loading("submit-btn", false);
    assert!(!page.is_disabled("#submit-btn")?);
    page.assert_text("#submit-btn", "Submit answer")?;

    // Missing buttons are a silent no-op.
    page.set_button_loading("no-such-button", true);
    Ok(())
}

#[test]
fn disabled_loading_button_swallows_clicks() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    page.set_button_loading("submit-btn", true);
    page.click("#submit-btn")?;
    page.assert_text("#submit-btn", "Loading...")?;
    Ok(())
}

#[test]
fn toast_is_appended_classed_and_expires() -> Result<()> {
    let mut page = Page::from_html("<body><p>content</p></body>")?;
    page.show_toast("Saved", ToastKind::Success);

    assert_eq!(page.count(".alert")?, 1);
    page.assert_exists("body > div.alert.alert-success")?;
    page.assert_text(".alert-success", "Saved")?;
    assert_eq!(
        page.style_value(".alert-success", "position")?.as_deref(),
        Some("fixed")
    );
    assert_eq!(
        page.style_value(".alert-success", "bottom")?.as_deref(),
        Some("20px")
    );

    page.advance_time(3_000)?;
    assert_eq!(
        page.style_value(".alert-success", "opacity")?.as_deref(),
        Some("0")
    );
    page.advance_time(301)?;
    page.assert_not_exists(".alert-success")?;
    Ok(())
}

#[test]
fn toast_lands_on_document_root_without_a_body() -> Result<()> {
    let mut page = Page::from_html("<p>fragment</p>")?;
    page.show_toast("hi", ToastKind::Info);
    assert!(page.exists(".alert-info")?);
    assert_eq!(page.text(".alert-info")?, "hi");
    assert_eq!(
        page.attr(".alert-info", "class")?.as_deref(),
        Some("alert alert-info")
    );
    Ok(())
}

#[test]
fn concurrent_toasts_expire_independently() -> Result<()> {
    let mut page = Page::from_html("<body></body>")?;
    page.show_toast("first", ToastKind::Info);
    page.advance_time(1_000)?;
    page.show_toast("second", ToastKind::Error);
    assert_eq!(page.count(".alert")?, 2);

    // First expires at 3300, second at 4300.
    page.advance_time_to(3_300)?;
    page.assert_not_exists(".alert-info")?;
    page.assert_exists(".alert-error")?;

    page.advance_time_to(4_300)?;
    page.assert_not_exists(".alert-error")?;
    Ok(())
}

#[test]
fn dismiss_toast_cancels_pending_timers() -> Result<()> {
    let mut page = Page::from_html("<body></body>")?;
    let toast = page.show_toast("temp", ToastKind::Warning);
    assert_eq!(page.pending_timers().len(), 1);

    assert!(page.dismiss_toast(toast));
    page.assert_not_exists(".alert-warning")?;
    assert!(page.pending_timers().is_empty());

    // Already gone; dismissing again reports that.
    assert!(!page.dismiss_toast(toast));
    Ok(())
}

#[test]
fn clicking_a_toast_dismisses_it_early() -> Result<()> {
    let mut page = Page::from_html("<body></body>")?;
    page.show_toast("click me", ToastKind::Info);

    page.click(".alert-info")?;
    page.assert_not_exists(".alert-info")?;
    assert!(page.pending_timers().is_empty());

    page.advance_time(10_000)?;
    Ok(())
}

#[test]
fn option_label_click_checks_nested_radio() -> Result<()> {
    let mut page = Page::from_html(QUIZ_PAGE)?;
    page.init();

    page.click("#opt-a")?;
    page.assert_checked("#radio-a", true)?;
    page.assert_checked("#radio-b", false)?;

    page.click("#opt-b")?;
    page.assert_checked("#radio-b", true)?;
    page.assert_checked("#radio-a", false)?;

    // A label with no nested radio swallows the click.
    page.click("#opt-empty")?;
    page.assert_checked("#radio-b", true)?;
    Ok(())
}

#[test]
fn clicks_bubble_from_nested_content_to_the_label() -> Result<()> {
    let html = "<label class='option-label' id='l'>\
                <input type='radio' name='q' id='r'><span id='caption'>pick</span></label>";
    let mut page = Page::from_html(html)?;
    page.init();

    page.click("#caption")?;
    page.assert_checked("#r", true)?;
    Ok(())
}

#[test]
fn pending_timers_sort_by_due_time_then_order() -> Result<()> {
    let mut page = Page::from_html(
        "<div class='alert' id='a'>a</div><div class='alert' id='b'>b</div>",
    )?;
    page.init();
    page.show_toast("t", ToastKind::Info);

    let timers = page.pending_timers();
    assert_eq!(timers.len(), 3);
    assert_eq!(timers[0].due_at, 3_000);
    assert_eq!(timers[1].due_at, 5_000);
    assert_eq!(timers[2].due_at, 5_000);
    assert!(timers[1].order < timers[2].order);
    Ok(())
}

#[test]
fn cancel_timer_reports_existence() -> Result<()> {
    let mut page = Page::from_html("<div class='alert' id='a'>a</div>")?;
    let handle = page.init();
    let timers = page.pending_timers();
    assert_eq!(timers.len(), 1);

    assert!(page.cancel_timer(timers[0].id));
    assert!(!page.cancel_timer(timers[0].id));
    page.advance_time(10_000)?;
    page.assert_exists("#a")?;
    drop(handle);
    Ok(())
}

#[test]
fn advance_time_rejects_negative_and_past_targets() -> Result<()> {
    let mut page = Page::from_html("<p>x</p>")?;
    let err = page
        .advance_time(-1)
        .expect_err("negative delta should fail");
    match err {
        Error::PageRuntime(msg) => assert!(msg.contains("non-negative")),
        other => panic!("unexpected error: {other:?}"),
    }

    page.advance_time(5)?;
    let err = page
        .advance_time_to(2)
        .expect_err("past target should fail");
    match err {
        Error::PageRuntime(msg) => assert!(msg.contains("requires target >= now_ms")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn timer_step_limit_guards_runaway_queues() -> Result<()> {
    let mut page = Page::from_html(
        "<div class='alert' id='a'>a</div><div class='alert' id='b'>b</div>",
    )?;
    page.init();
    page.set_timer_step_limit(1)?;

    let err = page.advance_time(5_000).expect_err("limit should trip");
    match err {
        Error::PageRuntime(msg) => assert!(msg.contains("timer step limit exceeded")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn cancel_all_timers_clears_every_pending_expiry() -> Result<()> {
    let mut page = Page::from_html(
        "<body><div class='alert' id='a'>a</div><div class='alert' id='b'>b</div></body>",
    )?;
    page.init();
    page.show_toast("t", ToastKind::Info);

    assert_eq!(page.cancel_all_timers(), 3);
    assert!(page.pending_timers().is_empty());
    assert_eq!(page.cancel_all_timers(), 0);

    page.advance_time(10_000)?;
    page.assert_exists("#a")?;
    page.assert_exists("#b")?;
    page.assert_exists(".alert-info")?;
    Ok(())
}

#[test]
fn run_due_timers_resumes_a_queue_after_a_step_limit_trip() -> Result<()> {
    let mut page = Page::from_html(
        "<div class='alert' id='a'>a</div><div class='alert' id='b'>b</div>",
    )?;
    page.init();
    page.set_timer_step_limit(1)?;
    page.advance_time(5_000).expect_err("limit should trip");

    // The first fade ran and moved the clock to its due time; the second is
    // still queued and already due.
    assert_eq!(page.now_ms(), 5_000);
    assert_eq!(page.style_value("#a", "opacity")?.as_deref(), Some("0"));
    assert_eq!(page.style_value("#b", "opacity")?, None);

    page.set_timer_step_limit(100)?;
    assert_eq!(page.run_due_timers()?, 1);
    assert_eq!(page.style_value("#b", "opacity")?.as_deref(), Some("0"));

    // Both removals now sit at 5300, beyond the current clock.
    assert_eq!(page.pending_timers().len(), 2);
    assert_eq!(page.run_due_timers()?, 0);
    page.advance_time(300)?;
    page.assert_not_exists(".alert")?;
    Ok(())
}

#[test]
fn attribute_edits_flow_through_page_behaviors() -> Result<()> {
    let mut page = Page::from_html("<form id='f'><input id='field' required></form>")?;
    assert!(!page.validate_form("f"));

    page.remove_attr("#field", "required")?;
    assert!(page.validate_form("f"));

    page.set_attr("#field", "id", "renamed")?;
    page.smooth_scroll_to("field");
    assert_eq!(page.scroll_target_id(), None);
    page.smooth_scroll_to("renamed");
    assert_eq!(page.scroll_target_id().as_deref(), Some("renamed"));

    page.set_attr("#renamed", "disabled", "true")?;
    assert!(page.is_disabled("#renamed")?);
    Ok(())
}

#[test]
fn flush_runs_everything_and_moves_the_clock() -> Result<()> {
    let mut page = Page::from_html("<div class='alert' id='a'>a</div>")?;
    page.init();
    page.show_toast("t", ToastKind::Info);

    page.flush()?;
    assert!(page.pending_timers().is_empty());
    page.assert_not_exists(".alert")?;
    assert_eq!(page.now_ms(), 5_300);
    Ok(())
}

#[test]
fn assert_text_failure_carries_a_dom_snippet() -> Result<()> {
    let page = Page::from_html("<p id='msg'>hello</p>")?;
    let err = page
        .assert_text("#msg", "goodbye")
        .expect_err("mismatch should fail");
    match err {
        Error::AssertionFailed {
            expected,
            actual,
            dom_snippet,
            ..
        } => {
            assert_eq!(expected, "goodbye");
            assert_eq!(actual, "hello");
            assert!(dom_snippet.contains("<p"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[test]
fn trace_logs_record_timer_and_notice_activity() -> Result<()> {
    let mut page = Page::from_html("<body></body>")?;
    page.enable_trace(true);
    page.set_trace_stderr(false);

    page.show_toast("traced", ToastKind::Info);
    page.advance_time(3_300)?;

    let logs = page.take_trace_logs();
    assert!(logs.iter().any(|line| line.starts_with("[timer] schedule")));
    assert!(logs.iter().any(|line| line.starts_with("[notice] toast")));
    assert!(logs.iter().any(|line| line.starts_with("[timer] advance")));
    assert!(page.take_trace_logs().is_empty());
    Ok(())
}
