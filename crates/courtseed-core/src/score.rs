// Set-score decoding: "6-4 3-6 7-5" -> games won and lost by one side.

use tracing::debug;

/// Total games for one participant, as `(own, opponent)`.
///
/// Each whitespace-separated token is a set written winner-first (`6-4`).
/// Only the first two dash-delimited fields are read; a token with fewer
/// fields or a non-integer field (`7-6(3)`, `RET`, `W/O`) is skipped and
/// contributes nothing. `None` or a string with no usable sets gives `(0, 0)`.
pub fn parse_games(score: Option<&str>, is_winner: bool) -> (u32, u32) {
    let Some(score) = score else {
        return (0, 0);
    };

    let mut winner_games = 0u32;
    let mut loser_games = 0u32;
    for token in score.split_whitespace() {
        match parse_set(token) {
            Some((w, l)) => {
                winner_games = winner_games.saturating_add(w);
                loser_games = loser_games.saturating_add(l);
            }
            None => debug!("skipping unparseable set token '{}'", token),
        }
    }

    if is_winner {
        (winner_games, loser_games)
    } else {
        (loser_games, winner_games)
    }
}

fn parse_set(token: &str) -> Option<(u32, u32)> {
    let mut fields = token.split('-');
    let w = fields.next()?.parse().ok()?;
    let l = fields.next()?.parse().ok()?;
    Some((w, l))
}
