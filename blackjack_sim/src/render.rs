use blackjack_lib::prelude::{Phase, Renderer, TableSnapshot};
use blackjack_lib::Card;
use std::io::Write;

const WIDTH: usize = 80;

fn cards_to_string(cards: &[Card]) -> String {
    cards
        .iter()
        .map(|c| c.to_string())
        .collect::<Vec<String>>()
        .join(" ")
}

/// Plain text `Renderer` writing each snapshot to `writer`.
pub struct TextRenderer<W: Write> {
    writer: W,
    /// Only render the settled table, skipping the snapshots taken while hands are played
    results_only: bool,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(writer: W) -> Self {
        TextRenderer {
            writer,
            results_only: false,
        }
    }

    pub fn results_only(mut self, results_only: bool) -> Self {
        self.results_only = results_only;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn format(snapshot: &TableSnapshot) -> String {
        let mut out = format!(
            "{:-^WIDTH$}\n",
            format!(" round {} ({}) ", snapshot.round, snapshot.phase)
        );

        let dealer_value = match snapshot.dealer_value {
            Some(v) => v.to_string(),
            None => "?".to_string(),
        };
        out.push_str(&format!(
            "{:<20}{} ({})\n",
            "dealer",
            cards_to_string(&snapshot.dealer_cards),
            dealer_value
        ));

        for player in snapshot.players.iter() {
            if player.sitting_out {
                out.push_str(&format!(
                    "{:<20}sitting out, {:.2} chips\n",
                    player.name, player.chips
                ));
                continue;
            }
            out.push_str(&format!(
                "{:<20}chips {:.2}, bet {:.2}\n",
                player.name, player.chips, player.bet
            ));
            for (i, hand) in player.hands.iter().enumerate() {
                let status = if hand.busted {
                    " bust"
                } else if hand.stayed {
                    " stay"
                } else {
                    ""
                };
                out.push_str(&format!(
                    "{:>8} {:<11}{} ({}) bet {:.2}{}\n",
                    "hand",
                    i + 1,
                    cards_to_string(&hand.cards),
                    hand.value,
                    hand.bet,
                    status
                ));
            }
        }

        if let Some(result) = snapshot.result.as_ref() {
            for player in result.players.iter().filter(|p| !p.sat_out) {
                out.push_str(&format!(
                    "{:<20}won {}, pushed {}, lost {}, net {:+.2}\n",
                    player.name,
                    player.hands_won,
                    player.hands_pushed,
                    player.hands_lost,
                    player.net
                ));
            }
        }
        out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn render(&mut self, snapshot: &TableSnapshot) {
        if self.results_only && snapshot.phase != Phase::Idle {
            return;
        }
        if let Err(e) = self.writer.write_all(Self::format(snapshot).as_bytes()) {
            log::warn!("unable to render round {}: {}", snapshot.round, e);
        }
    }
}
