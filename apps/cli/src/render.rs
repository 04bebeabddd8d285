use leadscout_core::{
    field_or_placeholder, AnalysisReport, Lead, Notice, NoticeLevel, PitchMessage, ScanResult,
    ScanSession,
};

pub fn notices(notices: &[Notice]) {
    for notice in notices {
        match notice.level {
            NoticeLevel::Info => println!("» {}", notice.text),
            NoticeLevel::Error => eprintln!("! {}", notice.text),
        }
    }
}

fn presence(result: &ScanResult) -> &'static str {
    if result.has_website() {
        "SITE OK"
    } else {
        "NO SITE"
    }
}

pub fn session(session: &ScanSession, is_saved: impl Fn(&str) -> bool) {
    if session.results.is_empty() {
        println!("No scan results. Run `leadscout scan <location>` first.");
        return;
    }
    println!(
        "{} in {}: {} results",
        session.niche,
        session.location,
        session.results.len()
    );
    for (index, result) in session.results.iter().enumerate() {
        let saved = if is_saved(&result.name) { " [saved]" } else { "" };
        println!();
        println!("#{:<3} {}{saved}", index + 1, result.name);
        println!(
            "     ★ {}  ({} reviews)  {}",
            result.rating,
            result.reviews,
            presence(result)
        );
        println!("     {}", result.address);
        if let Some(handle) = result.contact_handle() {
            println!("     WhatsApp: {handle}");
        }
        println!("     {}", result.insight);
    }
}

pub fn leads(leads: &[Lead]) {
    if leads.is_empty() {
        println!("No saved leads yet.");
        return;
    }
    println!("{} saved leads", leads.len());
    for lead in leads {
        let short_id: String = lead.id.chars().take(8).collect();
        println!();
        println!(
            "{short_id}  {:<12} {}  (added {})",
            lead.status.label(),
            lead.details.name,
            lead.date_added
        );
        println!(
            "          ★ {}  ({} reviews)  {}",
            lead.details.rating,
            lead.details.reviews,
            presence(&lead.details)
        );
        println!("          {}", lead.details.address);
        if let Some(handle) = lead.details.contact_handle() {
            println!("          WhatsApp: {handle}");
        }
    }
}

fn bullets(title: &str, items: &[String]) {
    println!("{title}");
    if items.is_empty() {
        println!("  • {}", field_or_placeholder(None));
    }
    for item in items {
        println!("  • {item}");
    }
}

pub fn analysis(name: &str, report: &AnalysisReport) {
    println!("Deep analysis: {name}");
    println!();
    println!("Owner:         {}", field_or_placeholder(report.owner.as_deref()));
    println!(
        "Registration:  {}",
        field_or_placeholder(report.registration_id.as_deref())
    );
    println!(
        "Admin contact: {}",
        field_or_placeholder(report.admin_contact.as_deref())
    );
    println!();
    bullets("Strengths", &report.strengths);
    bullets("Weaknesses", &report.weaknesses);
    bullets("Opportunities", &report.opportunities);
    bullets("Threats", &report.threats);
    println!();
    println!("Neighbourhood");
    println!(
        "  {}",
        field_or_placeholder(report.neighborhood_comparison.as_deref())
    );
    println!();
    println!(
        "Best opportunity: \"{}\"",
        field_or_placeholder(report.best_opportunity.as_deref())
    );
}

pub fn pitch(name: &str, pitch: &PitchMessage) {
    println!("Pitch for {name}");
    println!();
    println!("{}", pitch.message);
}
