// ─────────────────────────────── Tests ───────────────────────────────────

#[cfg(test)]
mod tests {
    use crate::cleaner::summary::{AREA_INSTRUCTION, summarize};
    use crate::cleaner::*;

    const FLAG: &str = "\u{1F3F4}\u{200D}\u{2620}\u{FE0F}";

    fn ad_samples() -> Vec<String> {
        vec![
            format!(
                "{FLAG} **אם אתה לא כאן אתה לא מעודכן**\n**חפשו אותנו בטלגרם**\n\
                 [24*6 NEWS](https://t.me/News24x6)\n[24*6 NEWS DISCUSSIONS](https://t.me/Group24x6)"
            ),
            format!(
                "{FLAG} **לא צריך לעבור מערוץ לערוץ,**\n**כל הידיעות בערוץ אחד!**\n\
                 [24*6 NEWS](https://t.me/News24x6)\n[24*6 NEWS DISCUSSIONS](https://t.me/Group24x6)"
            ),
            format!(
                "{FLAG} כל הדיווחים בערוץ אחד,\nוללא צנזורה!\n\
                 [24*6 NEWS](https://t.me/News24x6)\n[24*6 NEWS DISCUSSIONS](https://t.me/Group24x6)"
            ),
            format!("{FLAG} אם אתה לא כאן אתה לא מעודכן\nחפשו אותנו בטלגרם"),
            format!(
                "{FLAG} **אם אתה לא כאן**, **אתה לא מעודכן**!\n\
                 [ערוץ צבע אדום מבית 24X6 NEWS](https://t.me/red_alert_24x6)"
            ),
            "\u{1F1EE}\u{1F1F1} יש לכם חשבון טלגרם פרימיום ? אנחנו ממש נשמח שתתנו לנו BOOST (https://t.me/boost/News24x6).".to_owned(),
            format!(
                "{FLAG} הצטרפו עכשיו\n24*6 NEWS (https://t.me/News24x6)\n\
                 24*6 NEWS DISCUSSIONS (https://t.me/Group24x6)¹"
            ),
            "\u{1F17E}\u{FE0F}\u{1F182}\u{1F178}\u{1F17D}\u{1F183}Cosmos\u{1F397}\u{FE0F}".to_owned(),
        ]
    }

    // ── Ad-block stripper ──

    #[test]
    fn strips_bold_slogan_block_before_news() {
        let input = format!(
            "{FLAG} **אם אתה לא כאן אתה לא מעודכן**\n**חפשו אותנו בטלגרם**\n\
             [24*6 NEWS](https://t.me/News24x6)\n[24*6 NEWS DISCUSSIONS](https://t.me/Group24x6)\n\
             Breaking news text here"
        );
        assert_eq!(strip_ad_block(&input), "Breaking news text here");
    }

    /// Text as grammers renders entities back to markdown: bold `**…**`,
    /// italic `_…_`, text links `[…](…)`.
    #[test]
    fn strips_ads_from_client_markdown_and_keeps_body_formatting() {
        let input = format!(
            "_דיווח ראשוני:_ פיצוץ נשמע ב[חיפה](https://example.com/haifa_news)\n\n\
             {FLAG} **לא צריך לעבור מערוץ לערוץ,**\n**כל החדשות בערוץ אחד!**\n\
             [24*6 NEWS](https://t.me/News24x6)\n[24*6 NEWS DISCUSSIONS](https://t.me/Group24x6)"
        );
        let cleaned = clean_message(&input);
        assert_eq!(
            cleaned.body,
            "_דיווח ראשוני:_ פיצוץ נשמע ב[חיפה](https://example.com/haifa_news)"
        );
        assert!(!cleaned.is_alert());

        let sister = format!(
            "{FLAG} **אם אתה לא כאן**, **אתה לא מעודכן**!\n\
             [ערוץ צבע אדום מבית 24X6 NEWS](https://t.me/red_alert_24x6)\n\n\
             **עדכון:** _יירוט_ מעל הגליל"
        );
        assert_eq!(strip_ad_block(&sister), "**עדכון:** _יירוט_ מעל הגליל");
    }

    #[test]
    fn ad_only_messages_collapse_to_empty() {
        for ad in ad_samples() {
            assert_eq!(strip_ad_block(&ad), "", "ad survived stripping: {ad:?}");
            assert!(clean_message(&ad).is_empty(), "clean_message kept: {ad:?}");
        }
    }

    #[test]
    fn strip_is_idempotent_for_known_ads() {
        for ad in ad_samples() {
            let input = format!("כותרת הידיעה\nפרטים נוספים\n\n{ad}");
            let once = strip_ad_block(&input);
            assert_eq!(once, "כותרת הידיעה\nפרטים נוספים", "input: {input:?}");
            assert_eq!(strip_ad_block(&once), once);
        }
    }

    #[test]
    fn slogan_without_emphasis_markers_is_stripped() {
        let input = format!(
            "{FLAG} לא צריך לעבור מערוץ לערוץ,\nכל החדשות בערוץ אחד!\n\
             [24*6 NEWS](https://t.me/News24x6)\n[24*6 NEWS DISCUSSIONS](https://t.me/Group24x6)\n\
             פיצוץ נשמע במרכז"
        );
        assert_eq!(strip_ad_block(&input), "פיצוץ נשמע במרכז");
    }

    #[test]
    fn several_ads_in_one_message_are_all_removed() {
        let input = format!(
            "ידיעה\n\u{1F17E}\u{FE0F}\u{1F182}\u{1F178}\u{1F17D}\u{1F183}Cosmos\u{1F397}\u{FE0F}\n\n\
             {FLAG} אם אתה לא כאן אתה לא מעודכן\nחפשו אותנו בטלגרם"
        );
        assert_eq!(strip_ad_block(&input), "ידיעה");
    }

    #[test]
    fn generic_signature_and_link_is_stripped() {
        let input = "התקיפה הסתיימה\nחדשות הצפון\nhttps://t.me/north_news";
        assert_eq!(strip_ad_block(input), "התקיפה הסתיימה");
    }

    #[test]
    fn generic_signature_rule_also_eats_a_trailing_link_line() {
        // Known over-match: a legitimate last line followed by a bare t.me
        // link is indistinguishable from a channel signature.
        let input = "Read the full statement\nhttps://t.me/gov_channel/123";
        assert_eq!(strip_ad_block(input), "");
    }

    #[test]
    fn blank_line_runs_collapse_to_one() {
        assert_eq!(strip_ad_block("\n\nA\n\n\n\nB\n\n"), "A\n\nB");
    }

    #[test]
    fn plain_news_is_untouched() {
        let input = "ראש הממשלה נאם הערב\nפרטים בהמשך";
        assert_eq!(strip_ad_block(input), input);
    }

    // ── Emphasis fix-up ──

    #[test]
    fn triple_emphasis_becomes_double() {
        assert_eq!(fix_triple_emphasis("***חשוב*** מאוד"), "**חשוב** מאוד");
        assert_eq!(
            fix_triple_emphasis("***a*** and ***b***"),
            "**a** and **b**"
        );
        assert_eq!(fix_triple_emphasis("**kept**"), "**kept**");
    }

    #[test]
    fn clean_message_fixes_emphasis_on_news() {
        let cleaned = clean_message("***עדכון***\nגוף הידיעה");
        assert_eq!(cleaned.body, "**עדכון**\nגוף הידיעה");
        assert!(!cleaned.is_alert());
    }

    // ── Flash alert ──

    #[test]
    fn flash_alert_lists_regions_once_in_order() {
        let input = "🚨 מבזק (18/06/2025) 14:32\n\
                     בדקות הקרובות צפויות להתקבל התרעות באזורך\n\
                     אזור גולן דרום\n\
                     אלוני הבשן, אפיק\n\
                     אזור גליל עליון\n\
                     קריית שמונה\n\
                     אזור גולן דרום\n\
                     חספין";
        let summary = summarize(input).expect("flash alert");
        assert_eq!(summary.kind, AlertKind::FlashAlert);
        assert_eq!(
            summary.text,
            format!(
                "🚨 מבזק (Flash Alert) - 18/06/2025 14:32\n{AREA_INSTRUCTION}\n\
                 אזורים עיקריים: גולן דרום, גליל עליון"
            )
        );
    }

    #[test]
    fn flash_alert_without_timestamp_or_regions() {
        let summary = summarize("מבזק חדשות").expect("flash alert");
        assert_eq!(
            summary.text,
            format!("🚨 מבזק (Flash Alert)\n{AREA_INSTRUCTION}\nאזורים עיקריים: אזורים לא ידועים")
        );
    }

    #[test]
    fn flash_takes_precedence_over_red_alert() {
        let input = "🚨 מבזק צבע אדום (18/06/2025) 14:32\n\
                     אזור גולן דרום\n\
                     היכנסו למרחב המוגן";
        let summary = summarize(input).expect("alert");
        assert_eq!(summary.kind, AlertKind::FlashAlert);
        assert!(summary.text.starts_with("🚨 מבזק (Flash Alert) - 18/06/2025 14:32\n"));
        assert!(!summary.text.contains("Red Alert"));
    }

    // ── Area alert ──

    #[test]
    fn area_alert_keeps_instruction_and_regions() {
        let input = format!("{AREA_INSTRUCTION}\nאזור שרון\nנתניה\nאזור דן\nתל אביב - יפו");
        let summary = summarize(&input).expect("area alert");
        assert_eq!(summary.kind, AlertKind::AreaAlert);
        assert_eq!(
            summary.text,
            format!("{AREA_INSTRUCTION}\nאזורים עיקריים: שרון, דן")
        );
    }

    #[test]
    fn area_instruction_must_open_the_message() {
        let input = format!("הודעת פיקוד\n{AREA_INSTRUCTION}\nאזור שרון");
        assert!(summarize(&input).is_none());
    }

    // ── Siren family ──

    #[test]
    fn red_alert_summary_with_instruction() {
        let input = "🔴 צבע אדום (18/06/2025) 14:35\n\
                     אזור קו העימות\n\
                     שלומי, חניתה\n\
                     אזור גליל מערבי\n\
                     נהריה\n\
                     היכנסו למרחב המוגן ושהו בו 10 דקות";
        let summary = summarize(input).expect("red alert");
        assert_eq!(summary.kind, AlertKind::RedAlert);
        assert_eq!(
            summary.text,
            "🚨 צבע אדום (Red Alert) - 18/06/2025 14:35\n\
             אזורים עיקריים: קו העימות, גליל מערבי\n\
             היכנסו למרחב המוגן ושהו בו 10 דקות"
        );
    }

    #[test]
    fn siren_regions_require_full_line_match() {
        let input = "צבע אדום\nאזור גליל עליון\nאזור דן 12";
        let summary = summarize(input).expect("red alert");
        assert_eq!(
            summary.text,
            "🚨 צבע אדום (Red Alert)\nאזורים עיקריים: גליל עליון"
        );
    }

    #[test]
    fn rocket_fire_without_instruction() {
        let input = "ירי רקטות וטילים (18/06/2025) 14:40\nאזור עוטף עזה\nשדרות";
        let summary = summarize(input).expect("rocket fire");
        assert_eq!(summary.kind, AlertKind::RocketFire);
        assert_eq!(
            summary.text,
            "🚨 ירי רקטות וטילים (Rocket/Missile Fire) - 18/06/2025 14:40\n\
             אזורים עיקריים: עוטף עזה"
        );
    }

    #[test]
    fn launch_phrasing_in_first_line_is_rocket_fire() {
        let summary = summarize("זוהו שיגורים מאיראן\nאזור מרכז הנגב").expect("rocket fire");
        assert_eq!(summary.kind, AlertKind::RocketFire);
        assert!(summary.text.ends_with("אזורים עיקריים: מרכז הנגב"));
    }

    #[test]
    fn shelter_exit_beats_rocket_fire() {
        let input = "ירי טילים (18/06/2025) 15:00\n\
                     ניתן לצאת מהמרחב המוגן באזורים הבאים\n\
                     אזור שרון";
        let summary = summarize(input).expect("shelter exit");
        assert_eq!(summary.kind, AlertKind::ShelterExit);
        assert_eq!(
            summary.text,
            "🚨 עדכון יציאה מהמרחב המוגן (Shelter Exit Update) - 18/06/2025 15:00\n\
             אזורים עיקריים: שרון\n\
             ניתן לצאת מהמרחב המוגן באזורים הבאים"
        );
    }

    #[test]
    fn event_ended_beats_everything_in_siren_family() {
        let input = "צבע אדום - האירוע הסתיים\n\
                     השוהים במרחב המוגן יכולים לצאת\n\
                     אזור דן\n\
                     ניתן לצאת מהמרחב המוגן";
        let summary = summarize(input).expect("event ended");
        assert_eq!(summary.kind, AlertKind::EventEnded);
        assert_eq!(
            summary.text,
            "🚨 עדכון סיום אירוע (Event Ended Update)\n\
             אזורים עיקריים: דן\n\
             השוהים במרחב המוגן יכולים לצאת"
        );
    }

    #[test]
    fn red_alert_phrase_outside_first_line_is_not_an_alert() {
        assert!(summarize("סיכום היום\nהיו 3 אזעקות צבע אדום בצפון").is_none());
    }

    #[test]
    fn ordinary_news_is_not_summarized() {
        let cleaned = clean_message("ראש הממשלה נאם הערב");
        assert_eq!(cleaned.alert_kind, None);
        assert_eq!(cleaned.body, "ראש הממשלה נאם הערב");
    }

    #[test]
    fn alert_summary_skips_ad_stripping() {
        let input = format!(
            "צבע אדום (18/06/2025) 14:35\nאזור דן\n\n{FLAG} אם אתה לא כאן אתה לא מעודכן\nחפשו אותנו בטלגרם"
        );
        let cleaned = clean_message(&input);
        assert_eq!(cleaned.alert_kind, Some(AlertKind::RedAlert));
        assert_eq!(
            cleaned.body,
            "🚨 צבע אדום (Red Alert) - 18/06/2025 14:35\nאזורים עיקריים: דן"
        );
    }
}
